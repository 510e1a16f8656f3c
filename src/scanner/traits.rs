//! Scan strategy abstraction.
//!
//! Both probing depths share one orchestration skeleton (see
//! [`run_scan`](super::run_scan)); a strategy only decides what happens to a
//! single port and what extra work runs once the host is resolved.

use super::events::EventSink;
use crate::types::Port;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// State of a reported port. Only open ports are ever reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Open,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
        }
    }
}

/// Available probing depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Connect plus generic banner grab.
    Standard,
    /// Protocol-specific probes, security layer detection and subnet inference.
    ServiceDetection,
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::Standard
    }
}

impl ScanMode {
    /// Short tag prepended to status lines.
    pub fn status_prefix(self) -> &'static str {
        match self {
            Self::Standard => "[FAST]",
            Self::ServiceDetection => "[SD]",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Standard => {
                "Standard Scanning mode: Basic TCP port scanning with service detection"
            }
            Self::ServiceDetection => {
                "Service Detection mode: Enhanced service fingerprinting with real-time detection"
            }
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::ServiceDetection => write!(f, "Service Detection"),
        }
    }
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "standard scanning" | "fast" => Ok(Self::Standard),
            "service detection" | "service-detection" | "detect" | "sd" => {
                Ok(Self::ServiceDetection)
            }
            _ => Err(format!("unknown scan mode: {}", s)),
        }
    }
}

/// One open port, as classified by a strategy.
///
/// Created once by the task that probed the port and never modified after
/// it is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    pub port: Port,
    pub state: PortState,
    pub service: String,
    pub protocol: String,
    /// Time to complete the TCP handshake.
    pub latency_ms: u64,
    /// Empty when no version could be extracted.
    pub version: String,
    /// Sanitized banner, empty when none was captured.
    pub banner: String,
    pub mode: ScanMode,
}

impl PortResult {
    /// Create an open-port result with no banner information yet.
    pub fn open(port: Port, mode: ScanMode, latency_ms: u64) -> Self {
        Self {
            port,
            state: PortState::Open,
            service: String::new(),
            protocol: String::new(),
            latency_ms,
            version: String::new(),
            banner: String::new(),
            mode,
        }
    }

    /// Set the service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the protocol label.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Set the extracted version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the banner.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Whether the service name carries a security vendor tag.
    pub fn has_security_tag(&self) -> bool {
        self.service.contains('[') && self.service.contains(']')
    }
}

/// A probing depth plugged into the shared orchestration.
///
/// Implementations must be cheap to share across worker tasks; they hold
/// only read-only state.
#[async_trait]
pub trait ScanStrategy: Send + Sync {
    /// The mode this strategy implements.
    fn mode(&self) -> ScanMode;

    /// Per-operation socket timeout.
    fn timeout(&self) -> Duration;

    /// Extra work run once after resolution, before any port is probed.
    async fn prepare(&self, _ip: IpAddr, _events: &EventSink) {}

    /// Probe one port. `None` means the port is not open.
    ///
    /// Must never fail: every per-port error is absorbed here.
    async fn scan_port(&self, ip: IpAddr, host: &str, port: Port) -> Option<PortResult>;

    /// Optional narration for a result, published as a status event.
    fn narrate(&self, _result: &PortResult) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_mode_from_str() {
        assert_eq!("standard".parse::<ScanMode>().unwrap(), ScanMode::Standard);
        assert_eq!(
            "Standard Scanning".parse::<ScanMode>().unwrap(),
            ScanMode::Standard
        );
        assert_eq!(
            "Service Detection".parse::<ScanMode>().unwrap(),
            ScanMode::ServiceDetection
        );
        assert_eq!("sd".parse::<ScanMode>().unwrap(), ScanMode::ServiceDetection);
        assert!("stealth".parse::<ScanMode>().is_err());
    }

    #[test]
    fn test_scan_mode_display() {
        assert_eq!(ScanMode::Standard.to_string(), "Standard");
        assert_eq!(ScanMode::ServiceDetection.to_string(), "Service Detection");
        assert_eq!(ScanMode::ServiceDetection.status_prefix(), "[SD]");
    }

    #[test]
    fn test_port_result() {
        let port = Port::new(80).unwrap();
        let result = PortResult::open(port, ScanMode::ServiceDetection, 15)
            .with_service("Nginx [Cloudflare CDN/WAF]")
            .with_protocol("HTTP/1.1")
            .with_version("nginx/1.18.0")
            .with_banner("HTTP/1.1 200 OK Server: nginx/1.18.0");

        assert_eq!(result.state, PortState::Open);
        assert_eq!(result.latency_ms, 15);
        assert!(result.has_security_tag());
    }
}
