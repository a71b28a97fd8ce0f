//! Format sniffing, dimension validation and diagnostic metadata.
//!
//! Nothing here fails: detection falls back to [`DetectedFormat::Unknown`],
//! and validation problems are reported as data in a [`ValidationReport`]
//! so a batch of uploads can be checked in one pass.
//!
//! ## Magic numbers
//!
//! | Format | Leading bytes |
//! |---|---|
//! | PNG | `89 50 4E 47` |
//! | JPEG | `FF D8 FF` |
//! | GIF | `GIF8` |
//! | WebP | `RIFF` ․․․․ `WEBP` (bytes 8–11) |

use super::backend::{Dimensions, ImageBackend};
use super::calculations::aspect_ratio;
use super::session::LoadedImage;
use super::source::{ImageSource, data_url_mime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Image container format as sniffed from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Unknown,
}

impl DetectedFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Unknown => "unknown",
        }
    }

    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::Gif => Some("image/gif"),
            Self::Webp => Some("image/webp"),
            Self::Unknown => None,
        }
    }

    fn from_mime(mime: &str) -> Self {
        match mime.strip_prefix("image/") {
            Some("png") => Self::Png,
            Some("jpeg" | "jpg") => Self::Jpeg,
            Some("gif") => Self::Gif,
            Some("webp") => Self::Webp,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sniff the format from the first bytes of encoded data.
pub fn detect_bytes(bytes: &[u8]) -> DetectedFormat {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => DetectedFormat::Png,
        [0xFF, 0xD8, 0xFF, ..] => DetectedFormat::Jpeg,
        [b'G', b'I', b'F', b'8', ..] => DetectedFormat::Gif,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => DetectedFormat::Webp,
        _ => DetectedFormat::Unknown,
    }
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(12);
    std::fs::File::open(path)?
        .take(12)
        .read_to_end(&mut header)?;
    Ok(header)
}

/// Detect the format of a source without decoding it.
///
/// Binary sources (blobs, files) are sniffed from their first 12 bytes; data
/// URLs report their declared MIME subtype. Remote URLs, unreadable files and
/// unrecognised content are [`DetectedFormat::Unknown`].
pub fn detect_image_format(source: &ImageSource) -> DetectedFormat {
    match source {
        ImageSource::Blob(blob) => detect_bytes(&blob.bytes),
        ImageSource::File(path) => read_header(path)
            .map(|header| detect_bytes(&header))
            .unwrap_or(DetectedFormat::Unknown),
        ImageSource::DataUrl(url) => data_url_mime(url)
            .map(|mime| DetectedFormat::from_mime(&mime))
            .unwrap_or(DetectedFormat::Unknown),
        ImageSource::Url(_) => DetectedFormat::Unknown,
    }
}

/// Image subtype of a source as a string.
///
/// Data URLs report whatever `image/*` subtype they declare, including ones
/// that can't be sniffed (`bmp`, `svg+xml`, `avif`). Other sources report
/// the sniffed [`DetectedFormat`]. `None` when neither yields an image type.
pub fn detect_image_subtype(source: &ImageSource) -> Option<String> {
    match source {
        ImageSource::DataUrl(url) => data_url_mime(url)?
            .strip_prefix("image/")
            .filter(|subtype| !subtype.is_empty())
            .map(str::to_string),
        _ => match detect_image_format(source) {
            DetectedFormat::Unknown => None,
            format => Some(format.as_str().to_string()),
        },
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Dimension and aspect-ratio bounds. Unset bounds are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConstraints {
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_height: Option<u32>,
    pub min_aspect_ratio: Option<f64>,
    pub max_aspect_ratio: Option<f64>,
}

/// One violated constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    WidthBelowMin { actual: u32, min: u32 },
    WidthAboveMax { actual: u32, max: u32 },
    HeightBelowMin { actual: u32, min: u32 },
    HeightAboveMax { actual: u32, max: u32 },
    AspectBelowMin { actual: f64, min: f64 },
    AspectAboveMax { actual: f64, max: f64 },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::WidthBelowMin { actual, min } => {
                write!(f, "Image width {actual}px is less than minimum {min}px")
            }
            Self::WidthAboveMax { actual, max } => {
                write!(f, "Image width {actual}px exceeds maximum {max}px")
            }
            Self::HeightBelowMin { actual, min } => {
                write!(f, "Image height {actual}px is less than minimum {min}px")
            }
            Self::HeightAboveMax { actual, max } => {
                write!(f, "Image height {actual}px exceeds maximum {max}px")
            }
            Self::AspectBelowMin { actual, min } => {
                write!(f, "Aspect ratio {actual:.2} is less than minimum {min:.2}")
            }
            Self::AspectAboveMax { actual, max } => {
                write!(f, "Aspect ratio {actual:.2} exceeds maximum {max:.2}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub dimensions: Dimensions,
}

impl ValidationReport {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Check `dimensions` against every set bound.
pub fn validate_image(dimensions: Dimensions, constraints: &ValidationConstraints) -> ValidationReport {
    let Dimensions { width, height } = dimensions;
    let mut errors = Vec::new();

    if let Some(min) = constraints.min_width
        && width < min
    {
        errors.push(ValidationIssue::WidthBelowMin { actual: width, min });
    }
    if let Some(max) = constraints.max_width
        && width > max
    {
        errors.push(ValidationIssue::WidthAboveMax { actual: width, max });
    }
    if let Some(min) = constraints.min_height
        && height < min
    {
        errors.push(ValidationIssue::HeightBelowMin { actual: height, min });
    }
    if let Some(max) = constraints.max_height
        && height > max
    {
        errors.push(ValidationIssue::HeightAboveMax { actual: height, max });
    }

    let ratio = aspect_ratio((width, height));
    if let Some(min) = constraints.min_aspect_ratio
        && ratio < min
    {
        errors.push(ValidationIssue::AspectBelowMin { actual: ratio, min });
    }
    if let Some(max) = constraints.max_aspect_ratio
        && ratio > max
    {
        errors.push(ValidationIssue::AspectAboveMax { actual: ratio, max });
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        dimensions,
    }
}

/// Outcome of validating one file in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Checked(ValidationReport),
    Unreadable { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        matches!(&self.outcome, FileOutcome::Checked(report) if report.is_valid)
    }
}

/// Validate many files in parallel, reading only their headers.
///
/// Results keep the order of `paths`. A file that can't be identified is
/// reported as [`FileOutcome::Unreadable`] and the rest of the batch carries on.
pub fn validate_files(
    backend: &dyn ImageBackend,
    paths: &[PathBuf],
    constraints: &ValidationConstraints,
) -> Vec<FileReport> {
    paths
        .par_iter()
        .map(|path| {
            let outcome = match backend.identify(path) {
                Ok(dims) => FileOutcome::Checked(validate_image(dims, constraints)),
                Err(e) => FileOutcome::Unreadable {
                    error: e.to_string(),
                },
            };
            FileReport {
                path: path.clone(),
                outcome,
            }
        })
        .collect()
}

// ============================================================================
// Diagnostics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

/// Diagnostic metadata for a loaded image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub orientation: Orientation,
    pub megapixels: f64,
    pub source_format: DetectedFormat,
    pub byte_len: usize,
    pub has_alpha: bool,
}

pub fn image_info(image: &LoadedImage) -> ImageInfo {
    let (width, height) = (image.width(), image.height());
    let orientation = match width.cmp(&height) {
        std::cmp::Ordering::Greater => Orientation::Landscape,
        std::cmp::Ordering::Less => Orientation::Portrait,
        std::cmp::Ordering::Equal => Orientation::Square,
    };
    ImageInfo {
        width,
        height,
        aspect_ratio: aspect_ratio((width, height)),
        orientation,
        megapixels: (width as f64 * height as f64) / 1_000_000.0,
        source_format: image.source_format,
        byte_len: image.byte_len,
        has_alpha: image.pixels.pixels().any(|p| p.0[3] < 255),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{gif_bytes, jpeg_bytes, png_bytes, webp_bytes, write_png};
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // Detection
    // =========================================================================

    #[test]
    fn detects_magic_numbers() {
        assert_eq!(detect_bytes(&png_bytes(1, 1, [0; 4])), DetectedFormat::Png);
        assert_eq!(detect_bytes(&jpeg_bytes(2, 2)), DetectedFormat::Jpeg);
        assert_eq!(detect_bytes(&gif_bytes()), DetectedFormat::Gif);
        assert_eq!(detect_bytes(&webp_bytes()), DetectedFormat::Webp);
    }

    #[test]
    fn short_or_foreign_bytes_are_unknown() {
        assert_eq!(detect_bytes(&[]), DetectedFormat::Unknown);
        assert_eq!(detect_bytes(&[0x89, b'P']), DetectedFormat::Unknown);
        assert_eq!(detect_bytes(b"RIFF\0\0\0\0WAVE"), DetectedFormat::Unknown);
        assert_eq!(detect_bytes(b"%PDF-1.7"), DetectedFormat::Unknown);
    }

    #[test]
    fn detect_blob_source() {
        let source = ImageSource::from_bytes(jpeg_bytes(2, 2));
        assert_eq!(detect_image_format(&source), DetectedFormat::Jpeg);
    }

    #[test]
    fn detect_file_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logo.bin");
        write_png(&path, 3, 3, [0; 4]);
        assert_eq!(
            detect_image_format(&ImageSource::File(path)),
            DetectedFormat::Png
        );
    }

    #[test]
    fn detect_missing_file_is_unknown() {
        let source = ImageSource::File("/nonexistent/logo.png".into());
        assert_eq!(detect_image_format(&source), DetectedFormat::Unknown);
    }

    #[test]
    fn detect_data_url_uses_declared_type() {
        let source = ImageSource::parse("data:image/webp;base64,AAAA");
        assert_eq!(detect_image_format(&source), DetectedFormat::Webp);
        let source = ImageSource::parse("data:text/plain,hi");
        assert_eq!(detect_image_format(&source), DetectedFormat::Unknown);
    }

    #[test]
    fn subtype_keeps_declared_types_that_cannot_be_sniffed() {
        for (url, subtype) in [
            ("data:image/bmp;base64,AAAA", "bmp"),
            ("data:image/svg+xml;base64,AAAA", "svg+xml"),
            ("data:IMAGE/AVIF;base64,AAAA", "avif"),
            ("data:image/png;base64,AAAA", "png"),
        ] {
            let source = ImageSource::parse(url);
            assert_eq!(detect_image_subtype(&source).as_deref(), Some(subtype), "{url}");
        }
        let bmp = ImageSource::parse("data:image/bmp;base64,AAAA");
        assert_eq!(detect_image_format(&bmp), DetectedFormat::Unknown);
    }

    #[test]
    fn subtype_of_binary_sources_is_sniffed() {
        let blob = ImageSource::from_bytes(gif_bytes());
        assert_eq!(detect_image_subtype(&blob).as_deref(), Some("gif"));
        assert_eq!(detect_image_subtype(&ImageSource::parse("data:text/plain,hi")), None);
        assert_eq!(
            detect_image_subtype(&ImageSource::parse("https://cdn.example/a.png")),
            None
        );
    }

    #[test]
    fn detect_remote_url_is_unknown() {
        let source = ImageSource::parse("https://cdn.example/logo.png");
        assert_eq!(detect_image_format(&source), DetectedFormat::Unknown);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn no_constraints_is_valid() {
        let report = validate_image(dims(200, 50), &ValidationConstraints::default());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert_eq!(report.dimensions, dims(200, 50));
    }

    #[test]
    fn too_wide_reports_one_width_error() {
        let constraints = ValidationConstraints {
            max_width: Some(100),
            ..Default::default()
        };
        let report = validate_image(dims(200, 50), &constraints);
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.messages()[0].contains("width"));
        assert_eq!(
            report.errors[0],
            ValidationIssue::WidthAboveMax {
                actual: 200,
                max: 100
            }
        );
    }

    #[test]
    fn every_violation_is_reported() {
        let constraints = ValidationConstraints {
            min_width: Some(300),
            min_height: Some(100),
            max_aspect_ratio: Some(2.0),
            ..Default::default()
        };
        let report = validate_image(dims(200, 50), &constraints);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn aspect_bounds_are_inclusive() {
        let constraints = ValidationConstraints {
            min_aspect_ratio: Some(2.0),
            max_aspect_ratio: Some(2.0),
            ..Default::default()
        };
        assert!(validate_image(dims(200, 100), &constraints).is_valid);
        assert!(!validate_image(dims(100, 100), &constraints).is_valid);
    }

    #[test]
    fn constraints_deserialize_from_toml() {
        let constraints: ValidationConstraints =
            toml::from_str("max_width = 400\nmin_aspect_ratio = 1.5").unwrap();
        assert_eq!(constraints.max_width, Some(400));
        assert_eq!(constraints.min_aspect_ratio, Some(1.5));
        assert!(toml::from_str::<ValidationConstraints>("max_widht = 1").is_err());
    }

    // =========================================================================
    // Batch validation
    // =========================================================================

    #[test]
    fn batch_continues_past_unreadable_files() {
        let tmp = TempDir::new().unwrap();
        let ok = tmp.path().join("ok.png");
        let big = tmp.path().join("big.png");
        write_png(&ok, 50, 20, [0; 4]);
        write_png(&big, 500, 20, [0; 4]);
        let missing = tmp.path().join("missing.png");

        let paths = vec![ok.clone(), missing.clone(), big.clone()];
        let constraints = ValidationConstraints {
            max_width: Some(100),
            ..Default::default()
        };
        let reports = validate_files(
            &crate::imaging::RustBackend::new(),
            &paths,
            &constraints,
        );

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].path, ok);
        assert!(reports[0].is_valid());
        assert!(matches!(reports[1].outcome, FileOutcome::Unreadable { .. }));
        assert!(!reports[2].is_valid());
    }

    #[test]
    fn batch_uses_identify_only() {
        let backend = MockBackend::with_dimensions(vec![dims(10, 10)]);
        let reports = validate_files(
            &backend,
            &[PathBuf::from("/virtual/a.png")],
            &ValidationConstraints::default(),
        );
        assert!(reports[0].is_valid());
        assert_eq!(backend.decode_count(), 0);
    }

    #[test]
    fn file_report_serializes_flat() {
        let report = FileReport {
            path: "a.png".into(),
            outcome: FileOutcome::Unreadable {
                error: "boom".into(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unreadable");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["path"], "a.png");
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn loaded(pixels: RgbaImage) -> LoadedImage {
        LoadedImage {
            key: "k".into(),
            pixels,
            source_format: DetectedFormat::Png,
            byte_len: 123,
        }
    }

    #[test]
    fn info_for_opaque_landscape() {
        let info = image_info(&loaded(RgbaImage::from_pixel(2000, 1000, Rgba([0, 0, 0, 255]))));
        assert_eq!(info.orientation, Orientation::Landscape);
        assert_eq!(info.aspect_ratio, 2.0);
        assert_eq!(info.megapixels, 2.0);
        assert!(!info.has_alpha);
        assert_eq!(info.byte_len, 123);
    }

    #[test]
    fn info_detects_alpha_and_orientation() {
        let info = image_info(&loaded(RgbaImage::new(10, 20)));
        assert_eq!(info.orientation, Orientation::Portrait);
        assert!(info.has_alpha);

        let info = image_info(&loaded(RgbaImage::from_pixel(5, 5, Rgba([1, 1, 1, 255]))));
        assert_eq!(info.orientation, Orientation::Square);
    }
}
