//! # exportkit
//!
//! Export configuration defaults and branding images for point-of-sale
//! reports. Exporters (CSV, JSON, Excel, PDF, plain text) never hard-code
//! their options: they ask the registry for an effective configuration and
//! ask an image session for logos, watermarks and placeholders.
//!
//! # Architecture: Two Independent Halves
//!
//! ```text
//! Registry   global → format template → preset → caller overrides  →  EffectiveConfig
//! Imaging    source → load (cache, timeout, cancel) → resize/draw  →  ImageArtifact
//! ```
//!
//! Neither half depends on the other. An exporter typically resolves its
//! config first, then reads `logo.enabled` / `watermark.enabled` from it to
//! decide which images to request.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`format`] | The closed set of export formats and their file metadata |
//! | [`defaults`] | Stock defaults, presets, the layer merge and [`defaults::Registry`] |
//! | [`config`] | `exportkit.toml` loading, stacking and validation |
//! | [`naming`] | Export filenames with optional UTC timestamps |
//! | [`imaging`] | Loading, resizing, encoding, branding and validation of images |
//! | [`cache`] | Bounded or unbounded LRU for decoded images |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Layers Are Plain JSON Maps
//!
//! Every layer is a `serde_json` object. Exporters own their option schema
//! and deployments may add keys the registry has never heard of, so the
//! merge works on untyped maps. Typed views ([`defaults::PdfDefaults`] and
//! friends) exist for exporters that want them and are produced with
//! [`defaults::EffectiveConfig::decode`].
//!
//! ## Shallow, Predictable Merging
//!
//! Caller layers replace scalars and arrays and merge option blocks one
//! level deep (`styles.header` keeps its other fields when only `font_size`
//! changes). Deeper objects are replaced whole. See
//! [`defaults::merge_layer`].
//!
//! ## Unknown Names Are Not Errors
//!
//! An unknown format yields the global defaults, an unknown preset yields an
//! empty layer. Lookups never fail; exporters decide whether a missing
//! option matters.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing and encoding use the `image` crate; text for
//! watermarks and placeholders is laid out as SVG and rasterized with
//! `resvg`. No system libraries are needed.
//!
//! ## Sessions Own Their Cache
//!
//! Decoded images live in an [`imaging::ImageSession`] rather than a global.
//! One export job gets one session; dropping it frees every decoded image.

pub mod cache;
pub mod config;
pub mod defaults;
pub mod format;
pub mod imaging;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
