//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use super::report::{Outcome, ScanReport};
use crate::scanner::ScanMode;
use console::style;
use std::io::{self, Write};

const RULE: &str = "═════════════════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "─────────────────────────────────────────────────────────────────────────";

/// Print the report in human-readable plain text format.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_plain(&mut out, report)
}

/// Render the report to any writer.
pub fn write_plain<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                         {} Scan Results", style("Anibus").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    // Scan info
    writeln!(out, "  {} {}", style("Target:").bold(), report.target)?;
    if let Some(ip) = &report.ip_address {
        writeln!(out, "  {} {}", style("IP Address:").bold(), ip)?;
    }
    if let Some(hostname) = report.hostname.as_ref().filter(|h| *h != &report.target) {
        writeln!(out, "  {} {}", style("Hostname:").bold(), hostname)?;
    }
    writeln!(out, "  {} {}", style("Mode:").bold(), report.mode)?;
    if let Some(subnet) = &report.subnet {
        writeln!(
            out,
            "  {} {} (gateway {})",
            style("Subnet:").bold(),
            subnet,
            report.gateway.as_deref().unwrap_or("Unknown")
        )?;
    }
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    // Statistics
    writeln!(
        out,
        "  {} {} ports ({}) scanned in {:.2}s, {} open",
        style("Statistics:").bold(),
        report.ports_scanned,
        report.port_range,
        report.duration_ms as f64 / 1000.0,
        style(report.open_ports()).green().bold()
    )?;
    match report.outcome {
        Outcome::Cancelled => writeln!(out, "  {}", style("Scan stopped by user.").yellow())?,
        Outcome::Failed => writeln!(
            out,
            "  {} {}",
            style("Scan failed:").red().bold(),
            report.error.as_deref().unwrap_or("unknown error")
        )?,
        Outcome::Running | Outcome::Completed => {}
    }
    writeln!(out)?;

    // Port table
    if report.results.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:<6}  {:<24}  {:<20}  {:<16}  {:>7}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold(),
            style("PROTOCOL").bold(),
            style("VERSION").bold(),
            style("LATENCY").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for result in &report.results {
            let service = if result.has_security_tag() {
                style(truncate_string(&result.service, 24)).yellow().bold()
            } else {
                style(truncate_string(&result.service, 24))
            };
            writeln!(
                out,
                "  {:>6}  {:<6}  {:<24}  {:<20}  {:<16}  {:>5}ms",
                result.port.as_u16(),
                style(result.state).green().bold(),
                service,
                truncate_string(&result.protocol, 20),
                truncate_string(&result.version, 16),
                result.latency_ms
            )?;
            if !result.banner.is_empty() && report.mode == ScanMode::ServiceDetection {
                writeln!(out, "          {}", style(truncate_string(&result.banner, 64)).dim())?;
            }
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, mode: ScanMode, ports: usize, workers: usize) {
    eprintln!();
    eprintln!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("Anibus").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{} Mode: {}", style("•").dim(), style(mode).yellow());
    eprintln!("{} Target: {}", style("•").dim(), style(target).white().bold());
    eprintln!(
        "{} Scanning {} ports with {} workers...",
        style("•").dim(),
        style(ports).white().bold(),
        workers
    );
    eprintln!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate to at most `max_len` characters, adding an ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
