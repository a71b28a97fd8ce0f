//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output describes *what* was produced, not how. Each entity gets a header
//! line with its identity, followed by indented context lines. Long values
//! (data URLs, embedded base64) are truncated so a config dump stays
//! readable.
//!
//! # Output Format
//!
//! ## Config
//!
//! ```text
//! pdf (preset: print)
//!     filename: "export"
//!     orientation: "portrait"
//!     styles
//!         header
//!             font_size: 16
//! ```
//!
//! ## Artifacts
//!
//! ```text
//! Logo → brand.png
//!     150x50 (aspect 3.00), 2.1 KB, image/png
//!     Original: 300x100
//!     Position: top-left, padding 10
//! ```
//!
//! ## Validation
//!
//! ```text
//! ✓ logos/acme.png (120x40)
//! ✗ logos/wide.png (900x40)
//!     Image width 900px exceeds maximum 400px
//! ! logos/broken.png
//!     Failed to decode image: ...
//!
//! 3 checked: 1 valid, 1 invalid, 1 unreadable
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::defaults::{EffectiveConfig, Registry};
use crate::format::ExportFormat;
use crate::imaging::{
    DetectedFormat, FileOutcome, FileReport, ImageArtifact, ImageInfo, Placeholder, ProcessedLogo,
    Watermark,
};
use serde_json::Value;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", truncate(s, 60)),
        other => truncate(&other.to_string(), 60),
    }
}

fn walk_value(key: &str, value: &Value, depth: usize, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            lines.push(format!("{}{}", indent(depth), key));
            for (k, v) in map {
                walk_value(k, v, depth + 1, lines);
            }
        }
        other => lines.push(format!("{}{}: {}", indent(depth), key, format_scalar(other))),
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Format an effective configuration as an indented tree.
pub fn format_config_output(
    format: &str,
    preset: Option<&str>,
    config: &EffectiveConfig,
) -> Vec<String> {
    let mut lines = vec![match preset {
        Some(p) => format!("{format} (preset: {p})"),
        None => format.to_string(),
    }];
    for (key, value) in config.as_map() {
        walk_value(key, value, 1, &mut lines);
    }
    lines
}

pub fn print_config_output(format: &str, preset: Option<&str>, config: &EffectiveConfig) {
    for line in format_config_output(format, preset, config) {
        println!("{}", line);
    }
}

/// List every export format with its extension and MIME type.
pub fn format_formats_output() -> Vec<String> {
    ExportFormat::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| {
            format!(
                "{} {:<6} .{:<5} {}",
                format_index(i + 1),
                f.name(),
                f.extension(),
                f.mime_type()
            )
        })
        .collect()
}

pub fn print_formats_output() {
    for line in format_formats_output() {
        println!("{}", line);
    }
}

/// List presets with the formats each one configures.
pub fn format_presets_output(registry: &Registry) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, name) in registry.preset_names().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), name));
        let formats: Vec<&str> = registry
            .preset_formats(name)
            .into_iter()
            .map(ExportFormat::name)
            .collect();
        lines.push(format!("{}{}", indent(1), formats.join(", ")));
    }
    lines
}

pub fn print_presets_output(registry: &Registry) {
    for line in format_presets_output(registry) {
        println!("{}", line);
    }
}

// ============================================================================
// Artifacts
// ============================================================================

fn artifact_summary(artifact: &ImageArtifact) -> String {
    format!(
        "{}{}x{} (aspect {:.2}), {}, {}",
        indent(1),
        artifact.width,
        artifact.height,
        artifact.aspect_ratio,
        format_size(artifact.size()),
        artifact.mime
    )
}

pub fn format_logo_output(logo: &ProcessedLogo, out: &Path) -> Vec<String> {
    vec![
        format!("Logo → {}", out.display()),
        artifact_summary(&logo.artifact),
        format!(
            "{}Original: {}x{}",
            indent(1),
            logo.original.width,
            logo.original.height
        ),
        format!(
            "{}Position: {}, padding {}{}",
            indent(1),
            serde_json::to_value(logo.position)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            logo.padding,
            if logo.has_background {
                ", with background"
            } else {
                ""
            }
        ),
    ]
}

pub fn print_logo_output(logo: &ProcessedLogo, out: &Path) {
    for line in format_logo_output(logo, out) {
        println!("{}", line);
    }
}

pub fn format_watermark_output(mark: &Watermark, out: &Path) -> Vec<String> {
    vec![
        format!("Watermark \"{}\" → {}", mark.text, out.display()),
        artifact_summary(&mark.artifact),
        format!(
            "{}Angle {}°, opacity {}",
            indent(1),
            mark.angle,
            mark.opacity
        ),
    ]
}

pub fn print_watermark_output(mark: &Watermark, out: &Path) {
    for line in format_watermark_output(mark, out) {
        println!("{}", line);
    }
}

pub fn format_placeholder_output(placeholder: &Placeholder, out: &Path) -> Vec<String> {
    vec![
        format!(
            "Placeholder \"{}\" → {}",
            placeholder.label,
            out.display()
        ),
        artifact_summary(&placeholder.artifact),
    ]
}

pub fn print_placeholder_output(placeholder: &Placeholder, out: &Path) {
    for line in format_placeholder_output(placeholder, out) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspection
// ============================================================================

/// One line per source. A declared subtype the sniffer doesn't know (a
/// `data:image/bmp` URL) is shown as-is with its `image/*` MIME type.
pub fn format_detect_output(
    source: &str,
    format: DetectedFormat,
    subtype: Option<&str>,
) -> Vec<String> {
    let line = match (format.mime_type(), subtype) {
        (Some(mime), _) => format!("{} {} ({})", truncate(source, 60), format, mime),
        (None, Some(subtype)) => format!("{} {} (image/{})", truncate(source, 60), subtype, subtype),
        (None, None) => format!("{} {} (-)", truncate(source, 60), format),
    };
    vec![line]
}

pub fn print_detect_output(source: &str, format: DetectedFormat, subtype: Option<&str>) {
    for line in format_detect_output(source, format, subtype) {
        println!("{}", line);
    }
}

pub fn format_info_output(source: &str, info: &ImageInfo) -> Vec<String> {
    vec![
        truncate(source, 60),
        format!(
            "{}{}x{} {}, aspect {:.2}, {:.2} MP",
            indent(1),
            info.width,
            info.height,
            serde_json::to_value(info.orientation)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
            info.aspect_ratio,
            info.megapixels
        ),
        format!(
            "{}Format: {}, {}, {}",
            indent(1),
            info.source_format,
            format_size(info.byte_len),
            if info.has_alpha { "has alpha" } else { "opaque" }
        ),
    ]
}

pub fn print_info_output(source: &str, info: &ImageInfo) {
    for line in format_info_output(source, info) {
        println!("{}", line);
    }
}

/// Format batch validation results with a trailing summary line.
pub fn format_validation_output(reports: &[FileReport]) -> Vec<String> {
    let mut lines = Vec::new();
    let (mut valid, mut invalid, mut unreadable) = (0, 0, 0);

    for report in reports {
        let path = report.path.display();
        match &report.outcome {
            FileOutcome::Checked(result) => {
                let dims = format!("{}x{}", result.dimensions.width, result.dimensions.height);
                if result.is_valid {
                    valid += 1;
                    lines.push(format!("✓ {path} ({dims})"));
                } else {
                    invalid += 1;
                    lines.push(format!("✗ {path} ({dims})"));
                    for message in result.messages() {
                        lines.push(format!("{}{}", indent(1), message));
                    }
                }
            }
            FileOutcome::Unreadable { error } => {
                unreadable += 1;
                lines.push(format!("! {path}"));
                lines.push(format!("{}{}", indent(1), error));
            }
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{} checked: {} valid, {} invalid, {} unreadable",
        reports.len(),
        valid,
        invalid,
        unreadable
    ));
    lines
}

pub fn print_validation_output(reports: &[FileReport]) {
    for line in format_validation_output(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Dimensions, ValidationConstraints, validate_image};
    use serde_json::json;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn truncate_short() {
        assert_eq!(truncate("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_exact() {
        let text = "a".repeat(40);
        assert_eq!(truncate(&text, 40), text);
    }

    #[test]
    fn truncate_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate(&text, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    // =========================================================================
    // Registry output
    // =========================================================================

    #[test]
    fn config_output_nests_objects() {
        let mut map = serde_json::Map::new();
        map.insert("delimiter".into(), json!(","));
        map.insert("styles".into(), json!({"normal": {"font_size": 10}}));
        let lines = format_config_output("csv", None, &EffectiveConfig::from_map(map));

        assert_eq!(
            lines,
            vec![
                "csv",
                "    delimiter: \",\"",
                "    styles",
                "        normal",
                "            font_size: 10",
            ]
        );
    }

    #[test]
    fn config_output_names_preset() {
        let lines = format_config_output("pdf", Some("print"), &EffectiveConfig::default());
        assert_eq!(lines, vec!["pdf (preset: print)"]);
    }

    #[test]
    fn config_output_truncates_long_strings() {
        let mut map = serde_json::Map::new();
        map.insert("logo".into(), json!("x".repeat(500)));
        let lines = format_config_output("pdf", None, &EffectiveConfig::from_map(map));
        assert!(lines[1].len() < 100);
        assert!(lines[1].contains("..."));
    }

    #[test]
    fn formats_output_lists_all() {
        let lines = format_formats_output();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("003 excel"));
        assert!(lines[2].contains(".xlsx"));
    }

    #[test]
    fn presets_output_lists_formats() {
        let lines = format_presets_output(&Registry::stock());
        assert!(lines.iter().any(|l| l.ends_with("compact")));
        assert_eq!(lines.len(), 8);
    }

    // =========================================================================
    // Validation output
    // =========================================================================

    #[test]
    fn validation_output_summarizes() {
        let constraints = ValidationConstraints {
            max_width: Some(100),
            ..Default::default()
        };
        let reports = vec![
            FileReport {
                path: "a.png".into(),
                outcome: FileOutcome::Checked(validate_image(
                    Dimensions {
                        width: 50,
                        height: 50,
                    },
                    &constraints,
                )),
            },
            FileReport {
                path: "b.png".into(),
                outcome: FileOutcome::Checked(validate_image(
                    Dimensions {
                        width: 200,
                        height: 50,
                    },
                    &constraints,
                )),
            },
            FileReport {
                path: "c.png".into(),
                outcome: FileOutcome::Unreadable {
                    error: "IO error: not found".into(),
                },
            },
        ];

        let lines = format_validation_output(&reports);
        assert_eq!(lines[0], "✓ a.png (50x50)");
        assert_eq!(lines[1], "✗ b.png (200x50)");
        assert_eq!(lines[2], "    Image width 200px exceeds maximum 100px");
        assert_eq!(lines[3], "! c.png");
        assert_eq!(
            lines.last().unwrap(),
            "3 checked: 1 valid, 1 invalid, 1 unreadable"
        );
    }

    #[test]
    fn validation_output_empty_batch() {
        assert_eq!(
            format_validation_output(&[]),
            vec!["0 checked: 0 valid, 0 invalid, 0 unreadable"]
        );
    }

    #[test]
    fn detect_output_shows_mime() {
        assert_eq!(
            format_detect_output("logo.png", DetectedFormat::Png, Some("png")),
            vec!["logo.png png (image/png)"]
        );
        assert_eq!(
            format_detect_output("x", DetectedFormat::Unknown, None),
            vec!["x unknown (-)"]
        );
        assert_eq!(
            format_detect_output("data:image/bmp;base64,AA", DetectedFormat::Unknown, Some("bmp")),
            vec!["data:image/bmp;base64,AA bmp (image/bmp)"]
        );
    }
}
