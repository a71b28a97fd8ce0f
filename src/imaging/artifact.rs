//! Finished images in every representation an exporter might need.
//!
//! PDF writers want raw bytes, HTML previews want a data URL, JSON exports
//! embed base64. An [`ImageArtifact`] carries all three from a single encode
//! so the representations can never disagree.

use super::backend::{ImageBackend, ImageError};
use super::calculations::aspect_ratio;
use super::params::{ImageMime, Quality};
use super::surface::{Blob, Surface};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageArtifact {
    #[serde(skip)]
    pub blob: Blob,
    pub mime: ImageMime,
    pub data_url: String,
    pub base64: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

impl ImageArtifact {
    pub fn encode(
        backend: &dyn ImageBackend,
        surface: &Surface,
        mime: ImageMime,
        quality: Quality,
    ) -> Result<Self, ImageError> {
        let bytes = backend.encode(surface.pixels(), mime, quality)?;
        let blob = Blob { bytes, mime };
        let base64 = blob.to_base64();
        let data_url = format!("data:{mime};base64,{base64}");
        let (width, height) = surface.dimensions();
        Ok(Self {
            blob,
            mime,
            data_url,
            base64,
            width,
            height,
            aspect_ratio: aspect_ratio((width, height)),
        })
    }

    pub fn size(&self) -> usize {
        self.blob.size()
    }
}
