//! Application settings and paths.
//!
//! Settings live in an XDG-compliant JSON file. Every field has a default,
//! so a partial or missing file is fine.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::ScanMode;
use crate::types::ScanTarget;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/anibus)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "anibus", "anibus").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default worker pool size.
    pub default_workers: usize,
    /// Connect and read timeout for standard scanning, in milliseconds.
    pub standard_timeout_ms: u64,
    /// Connect and read timeout for service detection, in milliseconds.
    pub detection_timeout_ms: u64,
    /// Mode used when none is given on the command line.
    pub default_mode: ScanMode,
    /// Look up the canonical host name of the target.
    pub reverse_dns: bool,
    /// Bound on a single DNS lookup, in milliseconds.
    pub resolve_timeout_ms: u64,
    /// Service registry data files layered over the built-in tables.
    pub registry_files: Vec<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_workers: 100,
            standard_timeout_ms: 200,
            detection_timeout_ms: 500,
            default_mode: ScanMode::Standard,
            reverse_dns: true,
            resolve_timeout_ms: 3000,
            registry_files: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::discover()?.settings_file();
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(ScanTarget::MIN_WORKERS..=ScanTarget::MAX_WORKERS).contains(&self.default_workers) {
            return Err(ConfigError::InvalidFormat(format!(
                "default_workers must be between {} and {}, got {}",
                ScanTarget::MIN_WORKERS,
                ScanTarget::MAX_WORKERS,
                self.default_workers
            )));
        }
        if self.standard_timeout_ms == 0
            || self.detection_timeout_ms == 0
            || self.resolve_timeout_ms == 0
        {
            return Err(ConfigError::InvalidFormat("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn standard_timeout(&self) -> Duration {
        Duration::from_millis(self.standard_timeout_ms)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}
