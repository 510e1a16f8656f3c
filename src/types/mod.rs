//! Core type definitions using newtype patterns for type safety.
//!
//! These types reject invalid ports, ranges and pool sizes before any
//! scanning work is scheduled.

mod port;
mod target;

pub use port::{Port, PortError, PortRange};
pub use target::ScanTarget;
