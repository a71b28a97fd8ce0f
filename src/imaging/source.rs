//! Image sources and their cache identities.
//!
//! An [`ImageSource`] is anything a logo or product picture can come from:
//! a remote URL, an inline `data:` URL, a file on disk, or an in-memory blob
//! (e.g. an upload that hasn't been stored anywhere yet).
//!
//! ## Cache keys
//!
//! | Source | Key |
//! |---|---|
//! | URL | the URL itself |
//! | File | `file:` + path |
//! | Data URL | `data:sha256:` + hash of the full URL text |
//! | Blob | `blob:sha256:` + hash of the bytes |
//!
//! Hashing keeps keys short for multi-megabyte data URLs, and makes blobs
//! with identical content share one cache entry.
//!
//! ## Object URLs
//!
//! Blobs are decoded through a temporary object URL minted by
//! [`ObjectUrls`]. The returned [`ObjectUrl`] guard revokes the URL when it
//! drops, so every exit path (success, decode failure, timeout,
//! cancellation) releases it exactly once.

use super::backend::ImageError;
use crate::cache::hash_bytes;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory encoded image bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobSource {
    pub bytes: Arc<[u8]>,
    pub name: Option<String>,
}

impl fmt::Debug for BlobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobSource")
            .field("len", &self.bytes.len())
            .field("name", &self.name)
            .finish()
    }
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    DataUrl(String),
    File(PathBuf),
    Blob(BlobSource),
}

impl ImageSource {
    /// Classify a string reference: `data:` URLs, `http(s)://` URLs,
    /// `file://` URLs, and anything else as a filesystem path.
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lower = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();
        if lower.starts_with("data:") {
            Self::DataUrl(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            Self::File(PathBuf::from(path))
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Blob(BlobSource {
            bytes: bytes.into(),
            name: None,
        })
    }

    /// Stable identity used for caching and load-state tracking.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => format!("file:{}", path.display()),
            Self::DataUrl(url) => format!("data:sha256:{}", hash_bytes(url.as_bytes())),
            Self::Blob(blob) => format!("blob:sha256:{}", hash_bytes(&blob.bytes)),
        }
    }

    /// Short human-readable form for logs. Never includes inline payloads.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
            Self::DataUrl(url) => {
                let meta = url.split(',').next().unwrap_or("data:");
                format!("{meta},… ({} chars)", url.len())
            }
            Self::Blob(blob) => match &blob.name {
                Some(name) => format!("blob {name} ({} bytes)", blob.bytes.len()),
                None => format!("blob ({} bytes)", blob.bytes.len()),
            },
        }
    }
}

impl From<&str> for ImageSource {
    fn from(reference: &str) -> Self {
        Self::parse(reference)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Declared media type, lowercased. `text/plain` when omitted.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Media type declared by a `data:` URL, without decoding the payload.
pub fn data_url_mime(url: &str) -> Option<String> {
    let rest = strip_scheme(url)?;
    let meta = rest.split(',').next()?;
    let mime = meta.split(';').next().unwrap_or("").trim();
    if mime.is_empty() {
        Some("text/plain".to_string())
    } else {
        Some(mime.to_ascii_lowercase())
    }
}

fn strip_scheme(url: &str) -> Option<&str> {
    let head = url.get(..5)?;
    head.eq_ignore_ascii_case("data:").then(|| &url[5..])
}

/// Decode a `data:[<mime>][;base64],<payload>` URL.
pub fn parse_data_url(url: &str) -> Result<DataUrl, ImageError> {
    let rest = strip_scheme(url)
        .ok_or_else(|| ImageError::InvalidSource("not a data: URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidSource("data: URL has no payload".to_string()))?;

    let is_base64 = meta
        .rsplit(';')
        .next()
        .is_some_and(|p| p.trim().eq_ignore_ascii_case("base64"));
    let bytes = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact)
            .map_err(|e| ImageError::InvalidSource(format!("bad base64 payload: {e}")))?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok(DataUrl {
        mime: data_url_mime(url).unwrap_or_else(|| "text/plain".to_string()),
        bytes,
    })
}

// ============================================================================
// Object URLs
// ============================================================================

/// Registry of live object URLs.
///
/// Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrls {
    inner: Arc<ObjectUrlsInner>,
}

#[derive(Debug, Default)]
struct ObjectUrlsInner {
    live: Mutex<HashMap<String, Arc<[u8]>>>,
    next_id: AtomicU64,
    created: AtomicUsize,
    revoked: AtomicUsize,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an object URL for `bytes`. It stays resolvable until the returned
    /// guard drops.
    pub fn create(&self, bytes: Arc<[u8]>) -> ObjectUrl {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("blob:exportkit/{id}");
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), bytes);
        self.inner.created.fetch_add(1, Ordering::Relaxed);
        ObjectUrl {
            url,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Number of URLs created but not yet revoked.
    pub fn live(&self) -> usize {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn created(&self) -> usize {
        self.inner.created.load(Ordering::Relaxed)
    }

    pub fn revoked(&self) -> usize {
        self.inner.revoked.load(Ordering::Relaxed)
    }

    fn revoke(&self, url: &str) {
        let removed = self
            .inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
        if removed.is_some() {
            self.inner.revoked.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// A live object URL. Revoked on drop.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: ObjectUrls,
}

impl ObjectUrl {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}
