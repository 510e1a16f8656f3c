//! Command-line interface definitions for Anibus.
//!
//! Uses `clap` derive macros for declarative argument parsing. Options left
//! unset fall back to the settings file.

use crate::config::AppSettings;
use crate::scanner::ScanMode;
use crate::types::PortRange;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// A concurrent TCP port scanner with service fingerprinting.
#[derive(Parser, Debug)]
#[command(name = "anibus")]
#[command(version)]
#[command(about = "A concurrent TCP port scanner with service fingerprinting", long_about = None)]
pub struct Args {
    /// Target hostname or IP address
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Inclusive port range to scan (e.g., "80" or "1-1024")
    #[arg(short, long, default_value = "1-1024")]
    pub ports: PortRange,

    /// Scan mode [default: from settings, else standard]
    #[arg(short, long, value_enum)]
    pub mode: Option<ScanMode>,

    /// Number of concurrent probes, 1-500 [default: from settings, else 100]
    #[arg(short, long, env = "ANIBUS_WORKERS")]
    pub workers: Option<usize>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Service registry file (`port=Name|Protocol` per line), may be repeated
    #[arg(long = "registry", value_name = "FILE")]
    pub registry: Vec<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH", env = "ANIBUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip the reverse lookup of the target's canonical name
    #[arg(long)]
    pub no_reverse_dns: bool,

    /// Verbose output (status narration and debug logging)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress the header and progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Mode to run, with settings as the fallback.
    pub fn mode(&self, settings: &AppSettings) -> ScanMode {
        self.mode.unwrap_or(settings.default_mode)
    }

    pub fn workers(&self, settings: &AppSettings) -> usize {
        self.workers.unwrap_or(settings.default_workers)
    }

    /// Registry files from settings followed by those given on the command line.
    pub fn registry_files(&self, settings: &AppSettings) -> Vec<PathBuf> {
        settings
            .registry_files
            .iter()
            .chain(self.registry.iter())
            .cloned()
            .collect()
    }

    pub fn reverse_dns(&self, settings: &AppSettings) -> bool {
        settings.reverse_dns && !self.no_reverse_dns
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    Plain,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["anibus", "example.com"]).unwrap();
        let settings = AppSettings::default();

        assert_eq!(args.ports.to_string(), "1-1024");
        assert_eq!(args.mode(&settings), ScanMode::Standard);
        assert_eq!(args.workers(&settings), 100);
        assert_eq!(args.output, OutputFormat::Plain);
        assert!(args.reverse_dns(&settings));
    }

    #[test]
    fn test_flags_override_settings() {
        let args = Args::try_parse_from([
            "anibus",
            "10.0.0.1",
            "-p",
            "20-25",
            "-m",
            "service-detection",
            "-w",
            "300",
            "-o",
            "json",
            "--registry",
            "extra.txt",
            "--no-reverse-dns",
        ])
        .unwrap();
        let settings = AppSettings {
            registry_files: vec![PathBuf::from("base.txt")],
            ..AppSettings::default()
        };

        assert_eq!(args.ports.len(), 6);
        assert_eq!(args.mode(&settings), ScanMode::ServiceDetection);
        assert_eq!(args.workers(&settings), 300);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(
            args.registry_files(&settings),
            vec![PathBuf::from("base.txt"), PathBuf::from("extra.txt")]
        );
        assert!(!args.reverse_dns(&settings));
    }

    #[test]
    fn test_rejects_bad_ports() {
        assert!(Args::try_parse_from(["anibus", "host", "-p", "0-10"]).is_err());
        assert!(Args::try_parse_from(["anibus", "host", "-p", "100-10"]).is_err());
        assert!(Args::try_parse_from(["anibus", "host", "-v", "-q"]).is_err());
    }
}
