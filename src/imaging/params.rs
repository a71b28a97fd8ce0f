//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between callers (branding, CLI) and the pixel work in
//! [`surface`](super::surface) and the [`backend`](super::backend).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0.0–1.0, default 0.92). Clamped on construction.
//! - [`FitMode`]: How a source is scaled into a target box (`contain`, `cover`, `fill`).
//! - [`ResizeOptions`]: Explicit dimensions and/or max bounds plus a fit mode.
//! - [`ImageMime`]: Encodable output MIME types.
//! - [`OutputKind`]: Representation returned by a conversion.
//! - [`ConvertOptions`]: Encoding and output shape for a conversion.
//!
//! String parsing for [`ImageMime`] and [`OutputKind`] fails with
//! [`ImageError::UnsupportedConversion`]: asking for an encoding outside the
//! supported set is a caller error, reported before any pixel work starts.

use super::backend::ImageError;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale used by the JPEG encoder.
    pub fn percent(self) -> u8 {
        ((self.0 * 100.0).round() as u8).max(1)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.92)
    }
}

/// How a source image is scaled into a target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale to fit inside the box, letterboxed and centered. Never crops.
    #[default]
    Contain,
    /// Scale to cover the box, cropping the overflow evenly on both sides.
    Cover,
    /// Stretch to the exact box, ignoring aspect ratio.
    Fill,
}

impl FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            "fill" => Ok(Self::Fill),
            other => Err(format!("unknown fit mode: {other}")),
        }
    }
}

/// Target dimensions for a resize.
///
/// Explicit `width`/`height` set the box. `max_width`/`max_height` shrink it
/// (never enlarge). With `maintain_aspect_ratio` a single explicit dimension
/// derives the other from the source, and max bounds scale both together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub maintain_aspect_ratio: bool,
    pub fit: FitMode,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            max_width: None,
            max_height: None,
            maintain_aspect_ratio: true,
            fit: FitMode::Contain,
        }
    }
}

impl ResizeOptions {
    /// Fit inside `max_width` × `max_height`, preserving aspect ratio.
    pub fn bounded(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: Some(max_width),
            max_height: Some(max_height),
            ..Self::default()
        }
    }

    /// An exact box with the given fit mode.
    pub fn exact(width: u32, height: u32, fit: FitMode) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            fit,
            ..Self::default()
        }
    }
}

/// Encodable output MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageMime {
    #[default]
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
    /// Lossless WebP; `quality` is ignored.
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Pick the MIME type for an output path from its extension.
    pub fn from_extension(ext: &str) -> Result<Self, ImageError> {
        ext.parse()
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageMime {
    type Err = ImageError;

    /// Accepts full MIME types (`image/png`) and bare subtypes (`png`, `jpg`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let subtype = lower.strip_prefix("image/").unwrap_or(&lower);
        match subtype {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            _ => Err(ImageError::UnsupportedConversion(s.to_string())),
        }
    }
}

/// Representation returned by a surface conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// Encoded bytes tagged with their MIME type.
    Blob,
    /// `data:<mime>;base64,<payload>`
    #[default]
    DataUrl,
    /// The data URL payload without its prefix.
    Base64,
    /// Raw encoded bytes.
    ArrayBuffer,
}

impl FromStr for OutputKind {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "blob" => Ok(Self::Blob),
            "dataurl" => Ok(Self::DataUrl),
            "base64" => Ok(Self::Base64),
            "arraybuffer" => Ok(Self::ArrayBuffer),
            _ => Err(ImageError::UnsupportedConversion(s.to_string())),
        }
    }
}

/// Encoding and output shape for a surface conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConvertOptions {
    pub kind: OutputKind,
    pub mime: ImageMime,
    pub quality: Quality,
}

/// Parse a CSS-style color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `transparent`,
/// `white` or `black`.
pub fn parse_color(value: &str) -> Result<Rgba<u8>, ImageError> {
    let trimmed = value.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "transparent" => return Ok(Rgba([0, 0, 0, 0])),
        "white" => return Ok(Rgba([255, 255, 255, 255])),
        "black" => return Ok(Rgba([0, 0, 0, 255])),
        _ => {}
    }

    let invalid = || ImageError::InvalidColor(value.to_string());
    let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Ok(Rgba([r, g, b, a]))
        }
        _ => Err(invalid()),
    }
}
