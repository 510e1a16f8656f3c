//! Events published by a scan run.
//!
//! A run reports everything through one closed event type delivered over an
//! unbounded channel; the host application drains it at its own pace.

use super::traits::PortResult;
use serde::Serialize;
use std::net::IpAddr;
use tokio::sync::mpsc;
use tracing::trace;

/// Everything a scan run can report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ScanEvent {
    /// The host resolved; fired once.
    HostResolved { ip: IpAddr },
    /// Fired once, before the first probe is dispatched.
    Started {
        ip: IpAddr,
        hostname: String,
        total_ports: usize,
    },
    /// One open port, in completion order.
    Result(PortResult),
    /// Fired on every task completion. `completed` never decreases.
    Progress { completed: usize, total: usize },
    /// Local subnet information, service detection only.
    SubnetDetected { cidr: String, gateway: String },
    /// Human-readable narration, advisory only.
    Status(String),
    Completed,
    Cancelled,
    Failed(String),
}

impl ScanEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed(_))
    }
}

/// Sending half of a run's event stream.
///
/// Sends never block and never fail: a consumer that stopped listening
/// does not affect the scan.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the host application drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: ScanEvent) {
        if self.tx.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(ScanEvent::Status(message.into()));
    }
}
