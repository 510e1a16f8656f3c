//! JSON output formatting.

use super::report::ScanReport;
use std::io;

/// Print the report as pretty JSON on stdout.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    println!("{}", to_json(report)?);
    Ok(())
}

pub fn to_json(report: &ScanReport) -> io::Result<String> {
    serde_json::to_string_pretty(report).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortResult, RunOutcome, ScanEvent, ScanMode};
    use crate::types::{Port, ScanTarget};
    use std::time::Duration;

    #[test]
    fn test_json_shape() {
        let target = ScanTarget::new("127.0.0.1", 20, 25, 4).unwrap();
        let mut report = ScanReport::new(&target, ScanMode::Standard);
        report.apply(&ScanEvent::Result(
            PortResult::open(Port::new(22).unwrap(), ScanMode::Standard, 2)
                .with_service("SSH")
                .with_protocol("TCP (SSH)")
                .with_version("OpenSSH_9.6"),
        ));
        report.finish(&RunOutcome::Completed, Duration::from_millis(40));

        let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(value["mode"], "standard");
        assert_eq!(value["port_range"], "20-25");
        assert_eq!(value["results"][0]["port"], 22);
        assert_eq!(value["results"][0]["version"], "OpenSSH_9.6");
    }
}
