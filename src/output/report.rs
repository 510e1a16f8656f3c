//! Scan report assembled from a run's event stream.

use crate::scanner::{PortResult, RunOutcome, ScanEvent, ScanMode};
use crate::types::ScanTarget;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Everything printed once a run has ended.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub mode: ScanMode,
    pub port_range: String,
    pub ports_scanned: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<PortResult>,
}

/// Serialized form of a run's terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ScanReport {
    pub fn new(target: &ScanTarget, mode: ScanMode) -> Self {
        Self {
            target: target.host().to_string(),
            ip_address: None,
            hostname: None,
            mode,
            port_range: target.ports().to_string(),
            ports_scanned: 0,
            started_at: Utc::now(),
            duration_ms: 0,
            subnet: None,
            gateway: None,
            outcome: Outcome::Running,
            error: None,
            results: Vec::new(),
        }
    }

    /// Fold one event into the report.
    pub fn apply(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::HostResolved { ip } => self.ip_address = Some(ip.to_string()),
            ScanEvent::Started { hostname, .. } => self.hostname = Some(hostname.clone()),
            ScanEvent::Result(result) => self.results.push(result.clone()),
            ScanEvent::Progress { completed, .. } => {
                self.ports_scanned = self.ports_scanned.max(*completed)
            }
            ScanEvent::SubnetDetected { cidr, gateway } => {
                self.subnet = Some(cidr.clone());
                self.gateway = Some(gateway.clone());
            }
            ScanEvent::Completed => self.outcome = Outcome::Completed,
            ScanEvent::Cancelled => self.outcome = Outcome::Cancelled,
            ScanEvent::Failed(reason) => {
                self.outcome = Outcome::Failed;
                self.error = Some(reason.clone());
            }
            ScanEvent::Status(_) => {}
        }
    }

    /// Record the outcome and elapsed time; results end up sorted by port.
    pub fn finish(&mut self, outcome: &RunOutcome, elapsed: Duration) {
        self.outcome = match outcome {
            RunOutcome::Completed => Outcome::Completed,
            RunOutcome::Cancelled => Outcome::Cancelled,
            RunOutcome::Failed(reason) => {
                self.error.get_or_insert_with(|| reason.clone());
                Outcome::Failed
            }
        };
        self.duration_ms = elapsed.as_millis() as u64;
        self.results.sort_by_key(|r| r.port);
    }

    pub fn open_ports(&self) -> usize {
        self.results.len()
    }
}
