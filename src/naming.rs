//! Export filename convention.
//!
//! Every generated download follows one pattern:
//!
//! ```text
//! <base>[_<timestamp>].<format>
//! report.csv
//! report_2024-01-02T03-04-05.csv
//! ```
//!
//! The timestamp is ISO-8601 in UTC with `:` and `.` replaced by `-` and the
//! fractional seconds dropped, so names sort chronologically and are valid on
//! every filesystem. [`parse_export_filename`] is the inverse and is used when
//! listing previous exports.
//!
//! Time is read through the [`Clock`] trait so the timestamped form is
//! deterministic under test.

use chrono::{DateTime, NaiveDateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format a timestamp the way export filenames embed it.
pub fn filename_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Build an export filename using the wall clock.
pub fn generate_filename(base: &str, format: &str, include_timestamp: bool) -> String {
    generate_filename_with_clock(base, format, include_timestamp, &SystemClock)
}

/// Build an export filename, reading the time from `clock`.
pub fn generate_filename_with_clock(
    base: &str,
    format: &str,
    include_timestamp: bool,
    clock: &impl Clock,
) -> String {
    if include_timestamp {
        format!("{}_{}.{}", base, filename_timestamp(clock.now()), format)
    } else {
        format!("{}.{}", base, format)
    }
}

/// Result of parsing a generated export filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilename {
    pub base: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Everything after the last `.`; empty if there is no extension.
    pub extension: String,
}

/// Split a filename produced by [`generate_filename`] back into its parts.
///
/// - `"report_2024-01-02T03-04-05.csv"` → base `report`, timestamp, ext `csv`
/// - `"stock_take.pdf"` → base `stock_take`, no timestamp (suffix isn't one)
/// - `"notes"` → base `notes`, no timestamp, empty extension
pub fn parse_export_filename(name: &str) -> ParsedFilename {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => (name, ""),
    };

    if let Some(underscore) = stem.rfind('_') {
        let suffix = &stem[underscore + 1..];
        if let Ok(naive) = NaiveDateTime::parse_from_str(suffix, TIMESTAMP_FORMAT) {
            return ParsedFilename {
                base: stem[..underscore].to_string(),
                timestamp: Some(naive.and_utc()),
                extension: extension.to_string(),
            };
        }
    }

    ParsedFilename {
        base: stem.to_string(),
        timestamp: None,
        extension: extension.to_string(),
    }
}
