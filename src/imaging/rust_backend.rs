//! Pure Rust codec backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (PNG, JPEG, GIF, WebP) | `image::load_from_memory` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha dropped, quality 1–100) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |

use super::backend::{Dimensions, ImageBackend, ImageError};
use super::params::{ImageMime, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True if `path` has an extension with a compiled-in decoder.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn codec_error(context: &str, err: image::ImageError) -> ImageError {
    match err {
        image::ImageError::IoError(io) => ImageError::Io(io),
        other => ImageError::Decode(format!("{context}: {other}")),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, ImageError> {
        let (width, height) = image::image_dimensions(path)
            .map_err(|e| codec_error(&path.display().to_string(), e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Decode("empty input".to_string()));
        }
        image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        pixels: &RgbaImage,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Vec<u8>, ImageError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Encode(format!(
                "cannot encode an empty {width}x{height} surface"
            )));
        }

        let mut buf = Vec::new();
        let result = match mime {
            ImageMime::Png => PngEncoder::new(&mut buf).write_image(
                pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            ImageMime::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, quality.percent()).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            ImageMime::Webp => WebPEncoder::new_lossless(&mut buf).write_image(
                pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        };
        result.map_err(|e| ImageError::Encode(format!("{mime}: {e}")))?;
        Ok(buf)
    }
}
