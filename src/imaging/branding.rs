//! Branding artifacts: processed logos, watermarks, logo placeholders.
//!
//! These are the high-level pipelines exporters call. Each one returns an
//! [`ImageArtifact`] (bytes, data URL and base64 from a single encode)
//! together with the metadata the exporter needs to place it.
//!
//! | Pipeline | Steps |
//! |---|---|
//! | [`process_logo`](ImageSession::process_logo) | load → contain within max box → optional backdrop → encode |
//! | [`create_watermark`](ImageSession::create_watermark) | rotated translucent text (SVG) → rasterize → encode |
//! | [`generate_logo_placeholder`](ImageSession::generate_logo_placeholder) | bordered box + centered label (SVG) → rasterize → encode |

use super::artifact::ImageArtifact;
use super::backend::{Dimensions, ImageError};
use super::params::{ImageMime, Quality, ResizeOptions};
use super::session::{ImageSession, LoadOptions};
use super::source::ImageSource;
use super::surface::{Surface, resize_image};
use super::vector::{escape_xml, paint, rasterize_svg};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Where an exporter should anchor a logo on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    Center,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl FromStr for LogoPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top-left" => Ok(Self::TopLeft),
            "top-center" => Ok(Self::TopCenter),
            "top-right" => Ok(Self::TopRight),
            "center" => Ok(Self::Center),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-center" => Ok(Self::BottomCenter),
            "bottom-right" => Ok(Self::BottomRight),
            other => Err(format!("unknown logo position: {other}")),
        }
    }
}

// ============================================================================
// Logo
// ============================================================================

#[derive(Debug, Clone)]
pub struct BrandingOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Opaque backdrop drawn behind the logo. `None` keeps transparency.
    pub background: Option<Rgba<u8>>,
    /// Placement metadata for the exporter; does not change the pixels.
    pub padding: u32,
    pub position: LogoPosition,
    pub mime: ImageMime,
    /// Falls back to the session quality.
    pub quality: Option<Quality>,
    /// Cache, timeout, cross-origin and cancellation for this logo's load.
    /// Falls back to the session's load options.
    pub load: Option<LoadOptions>,
}

impl Default for BrandingOptions {
    fn default() -> Self {
        Self {
            max_width: 150,
            max_height: 50,
            background: None,
            padding: 10,
            position: LogoPosition::TopLeft,
            mime: ImageMime::Png,
            quality: None,
            load: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedLogo {
    #[serde(flatten)]
    pub artifact: ImageArtifact,
    pub position: LogoPosition,
    pub padding: u32,
    pub original: Dimensions,
    pub has_background: bool,
}

// ============================================================================
// Watermark
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    pub width: u32,
    pub height: u32,
    /// Rotation in degrees, clockwise-positive as in SVG.
    pub angle: f32,
    pub opacity: f32,
    pub font_size: f32,
    pub font_family: String,
    pub color: Rgba<u8>,
    pub mime: ImageMime,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            angle: -45.0,
            opacity: 0.1,
            font_size: 48.0,
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            color: Rgba([0, 0, 0, 255]),
            mime: ImageMime::Png,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Watermark {
    #[serde(flatten)]
    pub artifact: ImageArtifact,
    pub text: String,
    pub angle: f32,
    pub opacity: f32,
}

// ============================================================================
// Placeholder
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderOptions {
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub background: Rgba<u8>,
    pub border: Rgba<u8>,
    pub border_width: u32,
    pub text_color: Rgba<u8>,
    pub font_size: f32,
    pub font_family: String,
    pub mime: ImageMime,
}

impl Default for PlaceholderOptions {
    fn default() -> Self {
        Self {
            width: 150,
            height: 50,
            text: "LOGO".to_string(),
            background: Rgba([0xf0, 0xf0, 0xf0, 0xff]),
            border: Rgba([0xcc, 0xcc, 0xcc, 0xff]),
            border_width: 2,
            text_color: Rgba([0x99, 0x99, 0x99, 0xff]),
            font_size: 14.0,
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            mime: ImageMime::Png,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    #[serde(flatten)]
    pub artifact: ImageArtifact,
    pub label: String,
    pub is_placeholder: bool,
}

// ============================================================================
// SVG documents
// ============================================================================

fn svg_open(width: u32, height: u32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    )
}

fn watermark_svg(text: &str, options: &WatermarkOptions) -> String {
    let cx = options.width as f32 / 2.0;
    let cy = options.height as f32 / 2.0;
    format!(
        r#"{open}<text x="{cx}" y="{cy}" font-family="{family}" font-size="{size}" text-anchor="middle" dominant-baseline="central" opacity="{opacity}" {fill} transform="rotate({angle} {cx} {cy})">{text}</text></svg>"#,
        open = svg_open(options.width, options.height),
        family = escape_xml(&options.font_family),
        size = options.font_size,
        opacity = options.opacity.clamp(0.0, 1.0),
        fill = paint("fill", options.color),
        angle = options.angle,
        text = escape_xml(text),
    )
}

fn placeholder_svg(options: &PlaceholderOptions) -> String {
    let inset = options.border_width as f32 / 2.0;
    let rect_w = (options.width as f32 - options.border_width as f32).max(0.0);
    let rect_h = (options.height as f32 - options.border_width as f32).max(0.0);
    format!(
        r#"{open}<rect x="{inset}" y="{inset}" width="{rect_w}" height="{rect_h}" {fill} {stroke} stroke-width="{bw}"/><text x="{cx}" y="{cy}" font-family="{family}" font-size="{size}" text-anchor="middle" dominant-baseline="central" {text_fill}>{label}</text></svg>"#,
        open = svg_open(options.width, options.height),
        fill = paint("fill", options.background),
        stroke = paint("stroke", options.border),
        bw = options.border_width,
        cx = options.width as f32 / 2.0,
        cy = options.height as f32 / 2.0,
        family = escape_xml(&options.font_family),
        size = options.font_size,
        text_fill = paint("fill", options.text_color),
        label = escape_xml(&options.text),
    )
}

// ============================================================================
// Pipelines
// ============================================================================

impl ImageSession {
    /// Load a logo and prepare it for embedding.
    ///
    /// Any failure along the way is reported as
    /// [`ImageError::LogoProcessing`] wrapping the underlying cause.
    #[tracing::instrument(skip_all, fields(source = %source.describe()))]
    pub async fn process_logo(
        &self,
        source: &ImageSource,
        options: &BrandingOptions,
    ) -> Result<ProcessedLogo, ImageError> {
        self.build_logo(source, options)
            .await
            .map_err(|e| ImageError::LogoProcessing {
                source: Box::new(e),
            })
    }

    async fn build_logo(
        &self,
        source: &ImageSource,
        options: &BrandingOptions,
    ) -> Result<ProcessedLogo, ImageError> {
        let load = options.load.as_ref().unwrap_or(&self.config().load);
        let image = self.load_image(source, load).await?;
        let original = image.dimensions();

        let resized = resize_image(
            &image.pixels,
            &ResizeOptions::bounded(options.max_width, options.max_height),
        );
        let surface = match options.background {
            Some(color) => {
                let mut backdrop = Surface::new(resized.width(), resized.height());
                backdrop.fill(color);
                backdrop.draw_surface(&resized, 0, 0);
                backdrop
            }
            None => resized,
        };

        let quality = options.quality.unwrap_or(self.config().quality);
        let artifact = ImageArtifact::encode(self.backend(), &surface, options.mime, quality)?;
        debug!(
            width = artifact.width,
            height = artifact.height,
            bytes = artifact.size(),
            "logo processed"
        );

        Ok(ProcessedLogo {
            artifact,
            position: options.position,
            padding: options.padding,
            original,
            has_background: options.background.is_some(),
        })
    }

    /// Render `text` as a rotated, translucent watermark.
    pub fn create_watermark(
        &self,
        text: &str,
        options: &WatermarkOptions,
    ) -> Result<Watermark, ImageError> {
        let pixels = rasterize_svg(&watermark_svg(text, options), options.width, options.height)?;
        let artifact = ImageArtifact::encode(
            self.backend(),
            &Surface::from_pixels(pixels),
            options.mime,
            self.config().quality,
        )?;
        Ok(Watermark {
            artifact,
            text: text.to_string(),
            angle: options.angle,
            opacity: options.opacity,
        })
    }

    /// Stand-in artifact for exports without a logo.
    pub fn generate_logo_placeholder(
        &self,
        options: &PlaceholderOptions,
    ) -> Result<Placeholder, ImageError> {
        let pixels = rasterize_svg(&placeholder_svg(options), options.width, options.height)?;
        let artifact = ImageArtifact::encode(
            self.backend(),
            &Surface::from_pixels(pixels),
            options.mime,
            self.config().quality,
        )?;
        Ok(Placeholder {
            artifact,
            label: options.text.clone(),
            is_placeholder: true,
        })
    }
}
