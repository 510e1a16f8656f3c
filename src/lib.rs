//! # Anibus - A Concurrent TCP Port Scanner and Service Fingerprinter
//!
//! Anibus scans an inclusive port range on one host, reports every open
//! port as soon as it is found, and classifies what is listening from the
//! banner the service returns.
//!
//! ## Features
//!
//! - **Two scan modes**: a fast standard scan and a deeper service detection
//!   scan with protocol-specific probes
//! - **Bounded concurrency**: a worker pool sized per scan, with cooperative
//!   cancellation and live progress
//! - **Fingerprinting**: service names, transport labels, version strings and
//!   CDN/WAF vendor tags
//! - **Event stream**: results, progress and narration delivered over a
//!   channel the caller drains at its own pace
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use anibus::coordinator::ScanCoordinator;
//! use anibus::scanner::{ScanEvent, ScanMode};
//! use anibus::services::ServiceRegistry;
//! use anibus::types::ScanTarget;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), anibus::ScanError> {
//!     let mut coordinator = ScanCoordinator::new(Arc::new(ServiceRegistry::builtin()));
//!     coordinator.set_active(ScanMode::Standard);
//!
//!     let target = ScanTarget::new("127.0.0.1", 1, 1024, 100)?;
//!     let mut handle = coordinator.execute(target)?;
//!
//!     while let Some(event) = handle.next_event().await {
//!         if let ScanEvent::Result(result) = event {
//!             println!("{} open: {}", result.port, result.service);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated ports, ranges and scan targets
//! - [`scanner`] - The shared run loop, the two strategies and the event type
//! - [`coordinator`] - Mode selection and run lifecycle
//! - [`resolver`] - Host name resolution
//! - [`banner`], [`services`], [`version`], [`fingerprint`] - Banner
//!   acquisition and classification
//! - [`subnet`] - Local subnet and gateway inference
//! - [`config`] - Settings file handling
//! - [`output`] - Report rendering
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod resolver;
pub mod scanner;
pub mod services;
pub mod subnet;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use coordinator::{ScanCoordinator, ScanHandle};
pub use error::{ConfigError, ScanError};
pub use scanner::{PortResult, Progress, RunOutcome, ScanEvent, ScanMode};
pub use types::{Port, PortRange, ScanTarget};
