//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` is the inclusive `[start, end]` span a single scan run covers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value as u32))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u32),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An inclusive range of ports. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPortRange")]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Create a new port range.
    pub fn new(start: Port, end: Port) -> Result<Self, PortError> {
        if start.0 > end.0 {
            Err(PortError::InvalidRange(start.0, end.0))
        } else {
            Ok(Self { start, end })
        }
    }

    /// Validate raw bounds as supplied by a caller.
    pub fn from_bounds(start: u32, end: u32) -> Result<Self, PortError> {
        let start = port_from_u32(start)?;
        let end = port_from_u32(end)?;
        Self::new(start, end)
    }

    /// Create a range containing a single port.
    pub const fn single(port: Port) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub const fn start(&self) -> Port {
        self.start
    }

    pub const fn end(&self) -> Port {
        self.end
    }

    /// Number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in this range, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }

}

/// Unvalidated wire form of a [`PortRange`].
#[derive(Deserialize)]
struct RawPortRange {
    start: u32,
    end: u32,
}

impl TryFrom<RawPortRange> for PortRange {
    type Error = PortError;

    fn try_from(raw: RawPortRange) -> Result<Self, Self::Error> {
        Self::from_bounds(raw.start, raw.end)
    }
}

fn port_from_u32(value: u32) -> Result<Port, PortError> {
    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or(PortError::OutOfRange(value))
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Parses `"80"` or `"1-1024"`.
impl FromStr for PortRange {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let parse = |part: &str| -> Result<u32, PortError> {
            part.trim()
                .parse()
                .map_err(|_| PortError::InvalidFormat(part.to_string()))
        };

        match s.split_once('-') {
            Some((start, end)) => Self::from_bounds(parse(start)?, parse(end)?),
            None => {
                let port = parse(s)?;
                Ok(Self::single(port_from_u32(port)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(80).is_some());
        assert!(Port::new(65535).is_some());
    }

    #[test]
    fn test_port_range_len() {
        let range = PortRange::from_bounds(1, 100).unwrap();
        assert_eq!(range.len(), 100);
        assert_eq!(range.iter().count(), 100);

        let full = PortRange::from_bounds(1, 65535).unwrap();
        assert_eq!(full.len(), 65535);
    }

    #[test]
    fn test_port_range_rejects_bad_bounds() {
        assert_eq!(
            PortRange::from_bounds(0, 10),
            Err(PortError::OutOfRange(0))
        );
        assert_eq!(
            PortRange::from_bounds(1, 70000),
            Err(PortError::OutOfRange(70000))
        );
        assert_eq!(
            PortRange::from_bounds(100, 50),
            Err(PortError::InvalidRange(100, 50))
        );
    }

    #[test]
    fn test_port_range_parsing() {
        let range: PortRange = "1-1024".parse().unwrap();
        assert_eq!(range.len(), 1024);
        assert_eq!(range.to_string(), "1-1024");

        let single: PortRange = "443".parse().unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single.to_string(), "443");

        assert!("".parse::<PortRange>().is_err());
        assert!("abc".parse::<PortRange>().is_err());
        assert!("20-10".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_port_range_deserialize_validates() {
        let range: PortRange = serde_json::from_str(r#"{"start":20,"end":25}"#).unwrap();
        assert_eq!(range.len(), 6);

        assert!(serde_json::from_str::<PortRange>(r#"{"start":25,"end":20}"#).is_err());
        assert!(serde_json::from_str::<PortRange>(r#"{"start":0,"end":20}"#).is_err());
        assert!(serde_json::from_str::<PortRange>(r#"{"start":1,"end":70000}"#).is_err());
    }
}
