//! Shared test utilities for the exportkit test suite.
//!
//! Provides synthetic encoded images (so no binary fixtures live in the
//! repo) and an in-memory [`FakeFetcher`] with controllable latency for
//! exercising timeouts and cancellation.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fetcher = FakeFetcher::new()
//!     .with("https://cdn.example/logo.png", png_bytes(300, 100, [255, 0, 0, 255]))
//!     .with_delay(Duration::from_secs(5));
//! ```

use crate::imaging::ImageError;
use crate::imaging::fetch::{CrossOrigin, Fetcher};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =========================================================================
// Synthetic images
// =========================================================================

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A solid-color PNG.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color))),
        ImageFormat::Png,
    )
}

/// A mid-grey JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([128, 128, 128]),
        )),
        ImageFormat::Jpeg,
    )
}

/// A 2×2 GIF.
pub fn gif_bytes() -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]))),
        ImageFormat::Gif,
    )
}

/// A 2×2 lossless WebP.
pub fn webp_bytes() -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]))),
        ImageFormat::WebP,
    )
}

/// Write a solid-color PNG to `path`.
pub fn write_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    std::fs::write(path, png_bytes(width, height, color)).unwrap();
}

// =========================================================================
// Fetcher
// =========================================================================

/// In-memory fetcher. Clones share routes and counters.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    routes: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    last_cross_origin: Arc<Mutex<Option<CrossOrigin>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    pub fn with(self, url: &str, bytes: Vec<u8>) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), bytes);
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_cross_origin(&self) -> Option<CrossOrigin> {
        *self.last_cross_origin.lock().unwrap()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        cross_origin: Option<CrossOrigin>,
    ) -> Result<Vec<u8>, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_cross_origin.lock().unwrap() = cross_origin;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let body = self.routes.lock().unwrap().get(url).cloned();
        body.ok_or_else(|| ImageError::Fetch {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        })
    }
}
