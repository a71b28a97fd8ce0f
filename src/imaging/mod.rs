//! Image processing for export branding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Load** | `reqwest` (URLs), `tokio::fs` (files), `base64` (data URLs) |
//! | **Decode / encode** | `image` (PNG, JPEG, GIF, WebP) |
//! | **Resize / composite** | `image::imageops` Lanczos3 + overlay |
//! | **Text** | `resvg` / `usvg` rasterizing generated SVG |
//! | **Batch validation** | `rayon` over header-only identify |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Sources / fetch / session**: where pixels come from, with caching,
//!   timeouts and cancellation
//! - **Surface / artifact**: drawing and single-pass encoding
//! - **Branding**: logos, watermarks, placeholders
//! - **Inspect**: format detection, validation, diagnostics

mod artifact;
pub mod backend;
mod branding;
mod calculations;
pub mod fetch;
mod inspect;
mod params;
pub mod rust_backend;
mod session;
mod source;
mod surface;
mod vector;

pub use artifact::ImageArtifact;
pub use backend::{Dimensions, ImageBackend, ImageError};
pub use branding::{
    BrandingOptions, LogoPosition, Placeholder, PlaceholderOptions, ProcessedLogo, Watermark,
    WatermarkOptions,
};
pub use calculations::{Placement, aspect_ratio, calculate_placement, calculate_target_dimensions};
pub use fetch::{CrossOrigin, Fetcher, HttpFetcher};
pub use inspect::{
    DetectedFormat, FileOutcome, FileReport, ImageInfo, Orientation, ValidationConstraints,
    ValidationIssue, ValidationReport, detect_bytes, detect_image_format, detect_image_subtype, image_info,
    validate_files, validate_image,
};
pub use params::{
    ConvertOptions, FitMode, ImageMime, OutputKind, Quality, ResizeOptions, parse_color,
};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
pub use session::{DEFAULT_TIMEOUT, ImageSession, LoadOptions, LoadState, LoadedImage, SessionConfig};
pub use source::{BlobSource, DataUrl, ImageSource, ObjectUrl, ObjectUrls, parse_data_url};
pub use surface::{Blob, Converted, Surface, convert_surface, resize_image};
pub use vector::rasterize_svg;
