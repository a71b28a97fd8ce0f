//! The closed set of export output formats.
//!
//! Registry lookups take a format *name* because export call sites pass
//! whatever string the UI hands them. [`ExportFormat::parse`] is the single
//! place that turns such a name into a typed format; anything it doesn't
//! recognise is treated by the registry as an empty format layer rather than
//! an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported export output kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Excel,
    Pdf,
    Txt,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Excel,
        ExportFormat::Pdf,
        ExportFormat::Txt,
    ];

    /// Parse a format name, case-insensitively. `xlsx` is accepted as an
    /// alias for [`ExportFormat::Excel`].
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "excel" | "xlsx" => Some(Self::Excel),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Canonical lowercase name, as used for registry keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "excel",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }

    /// Conventional file extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Excel => "xlsx",
            other => other.name(),
        }
    }

    /// MIME type an exporter should attach to the generated download.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
            Self::Txt => "text/plain",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse(" Pdf "), Some(ExportFormat::Pdf));
    }

    #[test]
    fn xlsx_is_an_excel_alias() {
        assert_eq!(ExportFormat::parse("xlsx"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::Excel.name(), "excel");
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(ExportFormat::parse("docx"), None);
        assert_eq!(ExportFormat::parse(""), None);
    }

    #[test]
    fn names_round_trip_through_parse() {
        for format in ExportFormat::ALL {
            assert_eq!(ExportFormat::parse(format.name()), Some(format));
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ExportFormat::Txt).unwrap();
        assert_eq!(json, "\"txt\"");
    }
}
