//! Raster surfaces: resize, composite, convert.
//!
//! A [`Surface`] is an owned RGBA pixel buffer that starts fully
//! transparent. Branding and resizing draw onto surfaces; conversion turns a
//! surface into one of the [`OutputKind`] representations with a single
//! encode.
//!
//! Scaling uses the Lanczos3 filter, compositing uses source-over alpha
//! blending (`image::imageops::overlay`).

use super::backend::{ImageBackend, ImageError};
use super::calculations::{Placement, calculate_placement, calculate_target_dimensions};
use super::params::{ConvertOptions, ImageMime, OutputKind, ResizeOptions};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// An RGBA drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// A fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn from_pixels(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Paint every pixel with `color`, replacing what was there.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    /// Scale `image` to the placement's size and blend it at its offset.
    /// Parts outside the surface are clipped.
    ///
    /// Only the source region that lands on the surface is scaled, so a
    /// `cover` placement of an extreme aspect ratio never materialises the
    /// full overscaled image.
    pub fn draw(&mut self, image: &RgbaImage, placement: Placement) {
        if placement.width == 0 || placement.height == 0 || image.width() == 0 || image.height() == 0
        {
            return;
        }
        if image.dimensions() == (placement.width, placement.height) {
            imageops::overlay(&mut self.pixels, image, placement.x, placement.y);
            return;
        }

        let left = placement.x.max(0);
        let top = placement.y.max(0);
        let right = (placement.x + i64::from(placement.width)).min(i64::from(self.width()));
        let bottom = (placement.y + i64::from(placement.height)).min(i64::from(self.height()));
        if right <= left || bottom <= top {
            return;
        }
        let (visible_w, visible_h) = ((right - left) as u32, (bottom - top) as u32);

        if (visible_w, visible_h) == (placement.width, placement.height) {
            let scaled = imageops::resize(
                image,
                placement.width,
                placement.height,
                FilterType::Lanczos3,
            );
            imageops::overlay(&mut self.pixels, &scaled, placement.x, placement.y);
            return;
        }

        let (src_x, src_w) = source_span(image.width(), placement.width, left - placement.x, visible_w);
        let (src_y, src_h) = source_span(image.height(), placement.height, top - placement.y, visible_h);
        let region = imageops::crop_imm(image, src_x, src_y, src_w, src_h).to_image();
        let scaled = imageops::resize(&region, visible_w, visible_h, FilterType::Lanczos3);
        imageops::overlay(&mut self.pixels, &scaled, left, top);
    }

    /// Blend another surface on top at `(x, y)` without scaling.
    pub fn draw_surface(&mut self, other: &Surface, x: i64, y: i64) {
        imageops::overlay(&mut self.pixels, &other.pixels, x, y);
    }
}

/// Map a visible span of a placement back onto source pixels.
///
/// `offset` and `visible` are in placement pixels; the result is the source
/// start and length, at least one pixel and never past the source edge.
fn source_span(natural: u32, placed: u32, offset: i64, visible: u32) -> (u32, u32) {
    let ratio = f64::from(natural) / f64::from(placed);
    let start = ((offset as f64 * ratio).floor() as u32).min(natural - 1);
    let len = ((f64::from(visible) * ratio).ceil() as u32).clamp(1, natural - start);
    (start, len)
}

/// Resize `image` according to `options`.
///
/// Target dimensions come from [`calculate_target_dimensions`]. When an exact
/// box is given the image is placed in it with the requested fit mode, so
/// `contain` letterboxes onto transparency and `cover` crops.
pub fn resize_image(image: &RgbaImage, options: &ResizeOptions) -> Surface {
    let natural = image.dimensions();
    let target = calculate_target_dimensions(natural, options);
    let mut surface = Surface::new(target.0, target.1);

    let exact_box = options.width.is_some() && options.height.is_some();
    let fit = if exact_box && options.maintain_aspect_ratio {
        options.fit
    } else {
        super::params::FitMode::Fill
    };
    surface.draw(image, calculate_placement(natural, target, fit));
    surface
}

/// Encoded image bytes tagged with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
}

impl Blob {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }
}

/// Result of [`convert_surface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    Blob(Blob),
    DataUrl(String),
    Base64(String),
    ArrayBuffer(Vec<u8>),
}

impl Converted {
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Blob(_) => OutputKind::Blob,
            Self::DataUrl(_) => OutputKind::DataUrl,
            Self::Base64(_) => OutputKind::Base64,
            Self::ArrayBuffer(_) => OutputKind::ArrayBuffer,
        }
    }
}

/// Encode `surface` once and shape the result as `options.kind`.
pub fn convert_surface(
    backend: &dyn ImageBackend,
    surface: &Surface,
    options: &ConvertOptions,
) -> Result<Converted, ImageError> {
    let bytes = backend.encode(surface.pixels(), options.mime, options.quality)?;
    let blob = Blob {
        bytes,
        mime: options.mime,
    };
    Ok(match options.kind {
        OutputKind::Blob => Converted::Blob(blob),
        OutputKind::DataUrl => Converted::DataUrl(blob.to_data_url()),
        OutputKind::Base64 => Converted::Base64(blob.to_base64()),
        OutputKind::ArrayBuffer => Converted::ArrayBuffer(blob.bytes),
    })
}
