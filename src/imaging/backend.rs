//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three codec operations every
//! backend must support: identify, decode and encode. Everything else in the
//! imaging module (placement, compositing, branding) works on decoded
//! [`RgbaImage`] buffers and never touches a codec directly.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in recording or counting backends to assert how often
//! the codecs actually run.

use super::params::{ImageMime, Quality};
use image::{DynamicImage, RgbaImage};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Failure kinds for image loading and processing.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid image source: {0}")]
    InvalidSource(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Image load timed out after {}ms: {key}", timeout.as_millis())]
    Timeout { key: String, timeout: Duration },
    #[error("Image load cancelled: {key}")]
    Cancelled { key: String },
    #[error("Unsupported conversion format: {0}")]
    UnsupportedConversion(String),
    #[error("Rendering failed: {0}")]
    Render(String),
    #[error("logo processing failed: {source}")]
    LogoProcessing { source: Box<ImageError> },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image codec backends.
///
/// `Send + Sync` so one backend can be shared by an async session and by
/// rayon workers validating files in parallel.
pub trait ImageBackend: Send + Sync {
    /// Read dimensions from a file header without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, ImageError>;

    /// Decode encoded bytes (PNG, JPEG, GIF, WebP) into pixels.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, ImageError>;

    /// Encode RGBA pixels. `quality` applies to lossy encoders only.
    fn encode(
        &self,
        pixels: &RgbaImage,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Vec<u8>, ImageError>;
}
