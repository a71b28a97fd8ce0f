//! Image sessions: loading, caching and load-state tracking.
//!
//! An [`ImageSession`] is created per export job. It owns the decoded-image
//! cache, the [`Fetcher`] used for remote URLs and the [`ImageBackend`] used
//! for codecs, and is dropped with the job so cached pixels never outlive it.
//!
//! ## Loading
//!
//! ```text
//! load_image(source)
//!   ├── cache hit? ─────────────────────────────► Arc<LoadedImage>
//!   └── Loading
//!        ├── read bytes (fetch / file / data URL / object URL)
//!        ├── decode via backend
//!        ├── raced against timeout and cancellation
//!        └── Loaded (cached) | Failed (not cached)
//! ```
//!
//! A load that times out or is cancelled is dropped at its next suspension
//! point: its result is never delivered and never cached.

use super::backend::{Dimensions, ImageBackend, ImageError};
use super::fetch::{CrossOrigin, Fetcher, HttpFetcher};
use super::inspect::{DetectedFormat, detect_bytes};
use super::params::Quality;
use super::rust_backend::RustBackend;
use super::source::{ImageSource, ObjectUrls, parse_data_url};
use crate::cache::{CacheStats, ImageCache};
use image::RgbaImage;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default time allowed for a single load.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-load options.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Serve from and populate the session cache.
    pub use_cache: bool,
    pub timeout: Duration,
    pub cross_origin: Option<CrossOrigin>,
    pub cancel: Option<CancellationToken>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            timeout: DEFAULT_TIMEOUT,
            cross_origin: None,
            cancel: None,
        }
    }
}

/// Session-wide settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// LRU bound for the decoded-image cache. `None` is unbounded.
    pub cache_capacity: Option<NonZeroUsize>,
    /// Options used by pipelines that load on the caller's behalf
    /// (logo processing).
    pub load: LoadOptions,
    /// Default encoding quality for artifacts.
    pub quality: Quality,
}

/// Where a source is in its load lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// Cache key of the source it was loaded from.
    pub key: String,
    pub pixels: RgbaImage,
    /// Format sniffed from the encoded bytes.
    pub source_format: DetectedFormat,
    /// Size of the encoded input.
    pub byte_len: usize,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.pixels.dimensions().into()
    }
}

/// Loads and caches images for one export job.
pub struct ImageSession {
    fetcher: Arc<dyn Fetcher>,
    backend: Arc<dyn ImageBackend>,
    cache: Mutex<ImageCache<Arc<LoadedImage>>>,
    states: Mutex<HashMap<String, LoadState>>,
    object_urls: ObjectUrls,
    config: SessionConfig,
}

impl ImageSession {
    /// Session with the HTTP fetcher and the `image`-crate backend.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_parts(
            Arc::new(HttpFetcher::new()),
            Arc::new(RustBackend::new()),
            config,
        )
    }

    pub fn with_parts(
        fetcher: Arc<dyn Fetcher>,
        backend: Arc<dyn ImageBackend>,
        config: SessionConfig,
    ) -> Self {
        Self {
            fetcher,
            backend,
            cache: Mutex::new(ImageCache::with_capacity(config.cache_capacity)),
            states: Mutex::new(HashMap::new()),
            object_urls: ObjectUrls::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn ImageBackend {
        self.backend.as_ref()
    }

    /// Object URL registry used for blob sources.
    pub fn object_urls(&self) -> &ObjectUrls {
        &self.object_urls
    }

    fn cache(&self) -> MutexGuard<'_, ImageCache<Arc<LoadedImage>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, key: &str, state: LoadState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), state);
    }

    pub fn load_state(&self, source: &ImageSource) -> LoadState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&source.cache_key())
            .cloned()
            .unwrap_or(LoadState::Unloaded)
    }

    pub fn is_cached(&self, source: &ImageSource) -> bool {
        self.cache().contains(&source.cache_key())
    }

    pub fn cached_len(&self) -> usize {
        self.cache().len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Drop every cached image. Load states are reset to unloaded.
    pub fn clear_cache(&self) {
        self.cache().clear();
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("image cache cleared");
    }

    /// Load with the session's default [`LoadOptions`].
    pub async fn load(&self, source: &ImageSource) -> Result<Arc<LoadedImage>, ImageError> {
        self.load_image(source, &self.config.load).await
    }

    /// Load and decode `source`, honouring cache, timeout and cancellation.
    #[tracing::instrument(skip_all, fields(source = %source.describe()))]
    pub async fn load_image(
        &self,
        source: &ImageSource,
        options: &LoadOptions,
    ) -> Result<Arc<LoadedImage>, ImageError> {
        let key = source.cache_key();

        if options.use_cache {
            if let Some(hit) = self.cache().get(&key) {
                debug!("cache hit");
                return Ok(hit);
            }
            debug!("cache miss");
        }

        if options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            let err = ImageError::Cancelled { key: key.clone() };
            debug!("cancelled before start");
            self.set_state(&key, LoadState::Failed(err.to_string()));
            return Err(err);
        }

        self.set_state(&key, LoadState::Loading);

        let load = tokio::time::timeout(options.timeout, self.read_and_decode(source, &key, options));
        let cancelled = async {
            match &options.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancelled => Err(ImageError::Cancelled { key: key.clone() }),
            result = load => result.unwrap_or_else(|_| Err(ImageError::Timeout {
                key: key.clone(),
                timeout: options.timeout,
            })),
        };

        match outcome {
            Ok(image) => {
                let image = Arc::new(image);
                if options.use_cache {
                    self.cache().insert(key.clone(), Arc::clone(&image));
                }
                self.set_state(&key, LoadState::Loaded);
                debug!(
                    width = image.width(),
                    height = image.height(),
                    "image loaded"
                );
                Ok(image)
            }
            Err(err) => {
                warn!(error = %err, "image load failed");
                self.set_state(&key, LoadState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    async fn read_and_decode(
        &self,
        source: &ImageSource,
        key: &str,
        options: &LoadOptions,
    ) -> Result<LoadedImage, ImageError> {
        match source {
            ImageSource::Url(url) => {
                let bytes = self.fetcher.fetch(url, options.cross_origin).await?;
                self.decode(key, &bytes)
            }
            ImageSource::DataUrl(url) => {
                let data = parse_data_url(url)?;
                self.decode(key, &data.bytes)
            }
            ImageSource::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                self.decode(key, &bytes)
            }
            ImageSource::Blob(blob) => {
                let object_url = self.object_urls.create(Arc::clone(&blob.bytes));
                let bytes = self.object_urls.resolve(object_url.url()).ok_or_else(|| {
                    ImageError::InvalidSource(format!("object URL revoked: {}", object_url.url()))
                })?;
                // Suspension point: a load cancelled here still revokes the URL.
                tokio::task::yield_now().await;
                self.decode(key, &bytes)
            }
        }
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Result<LoadedImage, ImageError> {
        let image = self.backend.decode(bytes)?;
        Ok(LoadedImage {
            key: key.to_string(),
            pixels: image.to_rgba8(),
            source_format: detect_bytes(bytes),
            byte_len: bytes.len(),
        })
    }
}
