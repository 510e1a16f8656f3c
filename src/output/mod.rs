//! Output formatting module.
//!
//! Provides formatters for plain text and JSON output of scan reports.

mod json_format;
mod plain;
mod report;

pub use json_format::{print_json, to_json};
pub use plain::{
    print_error, print_info, print_plain, print_scan_header, print_warning, write_plain,
};
pub use report::{Outcome, ScanReport};

use crate::cli::OutputFormat;
use std::io;

/// Format and print a report according to the specified format.
pub fn print_report(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => print_plain(report),
        OutputFormat::Json => print_json(report),
    }
}
