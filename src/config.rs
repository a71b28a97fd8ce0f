//! Export settings file.
//!
//! The stock registry ([`crate::defaults`]) covers every option. An
//! `exportkit.toml` lets a deployment adjust it without code changes:
//! house-wide defaults, per-format tweaks, extra presets and image session
//! limits.
//!
//! ```toml
//! [defaults]                 # layered onto GlobalDefaults
//! filename = "inventory"
//!
//! [overrides.csv]            # layered onto the csv template
//! delimiter = ";"
//!
//! [presets.branded.pdf]      # new preset, or shadows a builtin per format
//! orientation = "landscape"
//! logo = { enabled = true }
//!
//! [images]
//! cache_capacity = 64        # LRU bound for the session image cache
//! timeout_ms = 10000
//! quality = 0.92
//! ```
//!
//! Several files can be stacked (for instance a shared file and a
//! per-terminal one); later files win, tables merge recursively.
//!
//! Format keys must be one of the five format names. Unknown top-level keys
//! and unknown `[images]` keys are rejected to catch typos early. Option maps
//! under `defaults`, `overrides` and `presets` are open: exporters may read
//! keys this crate doesn't know about.

use crate::defaults::{ConfigMap, Registry};
use crate::format::ExportFormat;
use crate::imaging::{LoadOptions, Quality, SessionConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const SETTINGS_FILENAME: &str = "exportkit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `exportkit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    /// Overrides for the global defaults layer.
    pub defaults: ConfigMap,
    /// Per-format overrides keyed by format name, applied to the format template.
    pub overrides: BTreeMap<String, ConfigMap>,
    /// User presets: name → format name → partial config.
    pub presets: BTreeMap<String, BTreeMap<String, ConfigMap>>,
    /// Image session settings.
    pub images: ImageSettings,
}

/// Image session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSettings {
    /// Maximum number of decoded images kept per session.
    /// When absent the cache is unbounded and only cleared explicitly.
    pub cache_capacity: Option<usize>,
    /// Load timeout in milliseconds.
    pub timeout_ms: u64,
    /// Default encoding quality, 0.0–1.0.
    pub quality: f32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            cache_capacity: None,
            timeout_ms: 10_000,
            quality: 0.92,
        }
    }
}

impl ImageSettings {
    /// Session configuration derived from these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            cache_capacity: self.cache_capacity.and_then(NonZeroUsize::new),
            load: LoadOptions {
                timeout: Duration::from_millis(self.timeout_ms),
                ..LoadOptions::default()
            },
            quality: Quality::new(self.quality),
        }
    }
}

impl ExportSettings {
    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "images.timeout_ms must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be between 0.0 and 1.0".into(),
            ));
        }
        if self.images.cache_capacity == Some(0) {
            return Err(ConfigError::Validation(
                "images.cache_capacity must be at least 1 (omit it for unbounded)".into(),
            ));
        }
        if let Some(name) = self.presets.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "preset name {name:?} must not be empty"
            )));
        }
        let format_keys = self
            .overrides
            .keys()
            .map(|key| ("overrides", key))
            .chain(
                self.presets
                    .values()
                    .flat_map(|formats| formats.keys().map(|key| ("presets", key))),
            );
        for (section, key) in format_keys {
            if ExportFormat::parse(key).is_none() {
                return Err(ConfigError::Validation(format!(
                    "{section}: unknown format {key:?} (expected csv, json, excel, pdf or txt)"
                )));
            }
        }
        Ok(())
    }

    /// The stock registry with these settings layered on.
    pub fn registry(&self) -> Registry {
        let mut registry = Registry::stock().with_global_overrides(&self.defaults);
        for (key, overrides) in &self.overrides {
            if let Some(format) = ExportFormat::parse(key) {
                registry = registry.with_format_overrides(format, overrides);
            }
        }
        for (name, formats) in &self.presets {
            for (key, config) in formats {
                if let Some(format) = ExportFormat::parse(key) {
                    registry = registry.with_preset(name, format, config.clone());
                }
            }
        }
        registry
    }
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_settings(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge settings files in order (later wins), then deserialize and validate.
///
/// Missing files are skipped; with no files present the result is the
/// default settings.
pub fn load_settings_layers(paths: &[PathBuf]) -> Result<ExportSettings, ConfigError> {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for path in paths {
        if let Some(layer) = load_raw_settings(path)? {
            merged = merge_toml(merged, layer);
        }
    }
    let settings: ExportSettings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load `exportkit.toml` from the given directory.
pub fn load_settings(dir: &Path) -> Result<ExportSettings, ConfigError> {
    load_settings_layers(&[dir.join(SETTINGS_FILENAME)])
}

/// Returns a fully-commented stock `exportkit.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_settings_toml() -> &'static str {
    r##"# exportkit settings
# ==================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults unless marked as an example.
#
# Configuration for an export resolves in layers:
#   global defaults -> format template -> preset -> caller overrides
#
# Unknown top-level keys and unknown [images] keys cause an error.

# ---------------------------------------------------------------------------
# Global defaults (every format)
# ---------------------------------------------------------------------------
[defaults]
auto_download = true
filename = "export"
include_timestamp = true       # report_2024-01-02T03-04-05.csv
auto_detect_columns = true
include_metadata = false
metadata_fields = ["generated_at", "record_count"]
encoding = "utf-8"
date_format = "%Y-%m-%d"

# ---------------------------------------------------------------------------
# Per-format overrides (example)
# ---------------------------------------------------------------------------
# Keys are layered onto the stock template for that format. Style blocks
# merge; arrays and scalars replace.
#
# [overrides.csv]
# delimiter = ";"
#
# [overrides.pdf.styles.normal]
# font_size = 9

# ---------------------------------------------------------------------------
# Presets (example)
# ---------------------------------------------------------------------------
# Builtin presets: compact, detailed, print, minimal. A user preset with the
# same name replaces the builtin layer for the formats it defines.
#
# [presets.branded.pdf]
# orientation = "landscape"
# logo = { enabled = true, position = "top-right" }

# ---------------------------------------------------------------------------
# Image session
# ---------------------------------------------------------------------------
[images]
# Maximum decoded images kept per export session (LRU).
# Omit to keep every image until the session ends.
# cache_capacity = 64

# Give up on a logo/image load after this many milliseconds.
timeout_ms = 10000

# Default encoding quality for JPEG output (0.0 - 1.0).
quality = 0.92
"##
}
