//! Scan target specification.
//!
//! A `ScanTarget` is the immutable input of one scan run: the host to probe,
//! the inclusive port range and the size of the worker pool.

use super::port::PortRange;
use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input for a single scan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScanTarget")]
pub struct ScanTarget {
    host: String,
    ports: PortRange,
    workers: usize,
}

impl ScanTarget {
    /// Smallest accepted worker pool.
    pub const MIN_WORKERS: usize = 1;
    /// Largest accepted worker pool.
    pub const MAX_WORKERS: usize = 500;

    /// Build a target from raw caller input, validating everything up front.
    ///
    /// The host is expected to be sanitized already (see
    /// [`sanitize_host`](crate::resolver::sanitize_host)); only emptiness is
    /// checked here.
    pub fn new(host: impl Into<String>, start: u32, end: u32, workers: usize) -> ScanResult<Self> {
        let ports = PortRange::from_bounds(start, end)?;
        Self::with_range(host, ports, workers)
    }

    /// Build a target from an already validated range.
    pub fn with_range(
        host: impl Into<String>,
        ports: PortRange,
        workers: usize,
    ) -> ScanResult<Self> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(ScanError::InvalidConfig("host is required".to_string()));
        }
        if !(Self::MIN_WORKERS..=Self::MAX_WORKERS).contains(&workers) {
            return Err(ScanError::InvalidConfig(format!(
                "worker pool size {} is outside {}-{}",
                workers,
                Self::MIN_WORKERS,
                Self::MAX_WORKERS
            )));
        }

        Ok(Self {
            host,
            ports,
            workers,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ports(&self) -> PortRange {
        self.ports
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Total number of probes this target requires.
    pub fn total_ports(&self) -> usize {
        self.ports.len()
    }
}

/// Unvalidated wire form of a [`ScanTarget`].
#[derive(Deserialize)]
struct RawScanTarget {
    host: String,
    ports: PortRange,
    workers: usize,
}

impl TryFrom<RawScanTarget> for ScanTarget {
    type Error = ScanError;

    fn try_from(raw: RawScanTarget) -> ScanResult<Self> {
        Self::with_range(raw.host, raw.ports, raw.workers)
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_target() {
        let target = ScanTarget::new("example.com", 1, 100, 10).unwrap();
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.total_ports(), 100);
        assert_eq!(target.workers(), 10);
        assert_eq!(target.to_string(), "example.com:1-100");
    }

    #[test]
    fn test_rejects_invalid_ranges() {
        assert!(matches!(
            ScanTarget::new("host", 0, 10, 10),
            Err(ScanError::Port(_))
        ));
        assert!(matches!(
            ScanTarget::new("host", 10, 5, 10),
            Err(ScanError::Port(_))
        ));
        assert!(matches!(
            ScanTarget::new("host", 1, 65536, 10),
            Err(ScanError::Port(_))
        ));
    }

    #[test]
    fn test_rejects_bad_pool_and_host() {
        assert!(matches!(
            ScanTarget::new("host", 1, 10, 0),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            ScanTarget::new("host", 1, 10, 501),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            ScanTarget::new("   ", 1, 10, 10),
            Err(ScanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let target: ScanTarget = serde_json::from_str(
            r#"{"host":"127.0.0.1","ports":{"start":10,"end":20},"workers":4}"#,
        )
        .unwrap();
        assert_eq!(target.total_ports(), 11);
        assert_eq!(target.workers(), 4);

        let zero_workers = serde_json::from_str::<ScanTarget>(
            r#"{"host":"127.0.0.1","ports":{"start":10,"end":20},"workers":0}"#,
        );
        assert!(zero_workers.is_err());

        let inverted = serde_json::from_str::<ScanTarget>(
            r#"{"host":"127.0.0.1","ports":{"start":20,"end":10},"workers":4}"#,
        );
        assert!(inverted.is_err());

        let blank = serde_json::from_str::<ScanTarget>(
            r#"{"host":"  ","ports":{"start":1,"end":2},"workers":4}"#,
        );
        assert!(blank.is_err());
    }
}
