//! Format defaults registry.
//!
//! Every export resolves its configuration from the same stack of layers:
//!
//! ```text
//! GlobalDefaults        auto_download, filename, include_timestamp, ...
//!   └─ format defaults  csv / json / excel / pdf / txt templates
//!        └─ preset      named partial config ("print", "compact", ...)
//!             └─ caller overrides
//! ```
//!
//! The stock templates are typed structs ([`CsvDefaults`], [`PdfDefaults`],
//! ...) so the defaults are documented and checked by the compiler. They are
//! serialized into a [`ConfigMap`] before merging because callers override
//! them with open-ended option maps coming from UI code.
//!
//! ## Merge policy
//!
//! Global and format layers combine key-by-key; the format wins.
//!
//! Caller layers (presets and overrides) use the asymmetric policy in
//! [`merge_layer`]: an object-valued option (a style block, margins keyed by
//! name, a logo placement) is merged into the default block, and each
//! object-valued entry inside that block is merged one level further. Anything
//! nested deeper is replaced wholesale. Scalars, arrays and `null` always
//! replace the default. Data-bearing values such as column lists are therefore
//! never spliced together, while style blocks stay additive.
//!
//! Unknown formats and unknown presets are never errors: they contribute an
//! empty layer.

use crate::format::ExportFormat;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// An open option map, option name → JSON value.
pub type ConfigMap = Map<String, Value>;

/// Named presets: preset name → format → partial config.
pub type Presets = BTreeMap<String, BTreeMap<ExportFormat, ConfigMap>>;

// =============================================================================
// Stock templates
// =============================================================================

/// Format-independent options, applied beneath every format layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalDefaults {
    /// Trigger a download as soon as the document is generated.
    pub auto_download: bool,
    /// Base filename, without timestamp or extension.
    pub filename: String,
    /// Append a sortable timestamp to the filename.
    pub include_timestamp: bool,
    /// Derive columns from the first record when none are given.
    pub auto_detect_columns: bool,
    /// Embed an export metadata block (generation time, record count).
    pub include_metadata: bool,
    /// Which metadata fields to emit when `include_metadata` is set.
    pub metadata_fields: Vec<String>,
    pub encoding: String,
    /// strftime-style date format for date-valued cells.
    pub date_format: String,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            auto_download: true,
            filename: "export".to_string(),
            include_timestamp: true,
            auto_detect_columns: true,
            include_metadata: false,
            metadata_fields: vec!["generated_at".to_string(), "record_count".to_string()],
            encoding: "utf-8".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvDefaults {
    pub delimiter: String,
    pub quote_char: String,
    pub line_ending: String,
    pub include_headers: bool,
    /// Prefix a UTF-8 byte order mark so spreadsheet apps detect the encoding.
    pub include_bom: bool,
    /// Prefix cells starting with `=`, `+`, `-` or `@` with a quote.
    pub escape_formulas: bool,
    pub null_value: String,
}

impl Default for CsvDefaults {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            quote_char: "\"".to_string(),
            line_ending: "\r\n".to_string(),
            include_headers: true,
            include_bom: true,
            escape_formulas: true,
            null_value: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonDefaults {
    pub pretty: bool,
    pub indent: u32,
    /// Key wrapping the exported records. `None` emits a bare array.
    pub root_key: Option<String>,
    pub include_schema: bool,
    pub sort_keys: bool,
}

impl Default for JsonDefaults {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: 2,
            root_key: Some("data".to_string()),
            include_schema: false,
            sort_keys: false,
        }
    }
}

/// Spreadsheet cell styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: u32,
    pub font_color: String,
    pub fill_color: String,
    pub alignment: String,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            bold: false,
            font_size: 10,
            font_color: "#000000".to_string(),
            fill_color: "#FFFFFF".to_string(),
            alignment: "left".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelDefaults {
    pub sheet_name: String,
    pub auto_filter: bool,
    pub freeze_header: bool,
    pub auto_column_width: bool,
    pub max_column_width: u32,
    pub header_style: CellStyle,
    pub cell_style: CellStyle,
    pub number_format: String,
    pub date_format: String,
    pub zebra_stripes: bool,
}

impl Default for ExcelDefaults {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            auto_filter: true,
            freeze_header: true,
            auto_column_width: true,
            max_column_width: 60,
            header_style: CellStyle {
                bold: true,
                font_size: 11,
                font_color: "#FFFFFF".to_string(),
                fill_color: "#1F4E78".to_string(),
                alignment: "center".to_string(),
            },
            cell_style: CellStyle::default(),
            number_format: "#,##0.00".to_string(),
            date_format: "yyyy-mm-dd".to_string(),
            zebra_stripes: false,
        }
    }
}

/// Text style for one PDF element. Margins are `[left, top, right, bottom]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: u32,
    pub bold: bool,
    pub color: String,
    pub alignment: String,
    pub margin: [u32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 10,
            bold: false,
            color: "#111827".to_string(),
            alignment: "left".to_string(),
            margin: [0, 0, 0, 5],
            fill_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfStyles {
    pub header: TextStyle,
    pub subheader: TextStyle,
    pub table_header: TextStyle,
    pub normal: TextStyle,
    pub footer: TextStyle,
}

impl Default for PdfStyles {
    fn default() -> Self {
        Self {
            header: TextStyle {
                font_size: 16,
                bold: true,
                margin: [0, 0, 0, 10],
                ..TextStyle::default()
            },
            subheader: TextStyle {
                font_size: 12,
                bold: true,
                margin: [0, 10, 0, 5],
                ..TextStyle::default()
            },
            table_header: TextStyle {
                bold: true,
                color: "#FFFFFF".to_string(),
                fill_color: Some("#1F4E78".to_string()),
                margin: [0, 5, 0, 5],
                ..TextStyle::default()
            },
            normal: TextStyle::default(),
            footer: TextStyle {
                font_size: 8,
                color: "#6B7280".to_string(),
                alignment: "center".to_string(),
                margin: [0, 10, 0, 0],
                ..TextStyle::default()
            },
        }
    }
}

/// Where and how large the branding logo is placed on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoPlacement {
    pub enabled: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub position: String,
    pub padding: u32,
}

impl Default for LogoPlacement {
    fn default() -> Self {
        Self {
            enabled: false,
            max_width: 150,
            max_height: 50,
            position: "top-left".to_string(),
            padding: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkPlacement {
    pub enabled: bool,
    pub text: String,
    pub opacity: f32,
    pub angle: f32,
}

impl Default for WatermarkPlacement {
    fn default() -> Self {
        Self {
            enabled: false,
            text: String::new(),
            opacity: 0.1,
            angle: -45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfDefaults {
    pub page_size: String,
    pub orientation: String,
    /// `[left, top, right, bottom]` in points.
    pub page_margins: [u32; 4],
    pub font_family: String,
    pub styles: PdfStyles,
    pub logo: LogoPlacement,
    pub watermark: WatermarkPlacement,
    pub show_page_numbers: bool,
    pub table_layout: String,
}

impl Default for PdfDefaults {
    fn default() -> Self {
        Self {
            page_size: "A4".to_string(),
            orientation: "portrait".to_string(),
            page_margins: [40, 60, 40, 60],
            font_family: "Helvetica".to_string(),
            styles: PdfStyles::default(),
            logo: LogoPlacement::default(),
            watermark: WatermarkPlacement::default(),
            show_page_numbers: true,
            table_layout: "light-horizontal-lines".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxtDefaults {
    pub column_separator: String,
    pub line_width: u32,
    pub include_headers: bool,
    pub padding: u32,
    pub border_char: String,
    pub alignment: String,
    pub line_ending: String,
}

impl Default for TxtDefaults {
    fn default() -> Self {
        Self {
            column_separator: " | ".to_string(),
            line_width: 120,
            include_headers: true,
            padding: 1,
            border_char: "-".to_string(),
            alignment: "left".to_string(),
            line_ending: "\n".to_string(),
        }
    }
}

fn to_map<T: Serialize>(value: &T) -> ConfigMap {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => ConfigMap::new(),
    }
}

/// Stock global layer as an option map.
pub fn stock_global_defaults() -> ConfigMap {
    to_map(&GlobalDefaults::default())
}

/// Stock template for one format as an option map (without the global layer).
pub fn stock_format_defaults(format: ExportFormat) -> ConfigMap {
    match format {
        ExportFormat::Csv => to_map(&CsvDefaults::default()),
        ExportFormat::Json => to_map(&JsonDefaults::default()),
        ExportFormat::Excel => to_map(&ExcelDefaults::default()),
        ExportFormat::Pdf => to_map(&PdfDefaults::default()),
        ExportFormat::Txt => to_map(&TxtDefaults::default()),
    }
}

fn object(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        _ => ConfigMap::new(),
    }
}

/// The presets shipped with the registry.
pub fn builtin_presets() -> Presets {
    let mut presets = Presets::new();

    presets.insert(
        "compact".to_string(),
        BTreeMap::from([
            (ExportFormat::Json, object(json!({ "pretty": false }))),
            (
                ExportFormat::Pdf,
                object(json!({
                    "page_margins": [20, 30, 20, 30],
                    "styles": {
                        "normal": { "font_size": 8, "margin": [0, 0, 0, 2] },
                        "table_header": { "font_size": 8 }
                    }
                })),
            ),
            (ExportFormat::Txt, object(json!({ "padding": 0, "column_separator": "|" }))),
        ]),
    );

    presets.insert(
        "detailed".to_string(),
        BTreeMap::from([
            (ExportFormat::Csv, object(json!({ "include_headers": true }))),
            (
                ExportFormat::Json,
                object(json!({ "include_metadata": true, "include_schema": true })),
            ),
            (
                ExportFormat::Excel,
                object(json!({ "include_metadata": true, "zebra_stripes": true })),
            ),
            (
                ExportFormat::Pdf,
                object(json!({ "include_metadata": true, "show_page_numbers": true })),
            ),
        ]),
    );

    presets.insert(
        "print".to_string(),
        BTreeMap::from([
            (
                ExportFormat::Pdf,
                object(json!({
                    "orientation": "landscape",
                    "page_margins": [30, 40, 30, 40],
                    "styles": { "normal": { "font_size": 9 } },
                    "logo": { "enabled": true }
                })),
            ),
            (
                ExportFormat::Excel,
                object(json!({ "freeze_header": false, "auto_filter": false })),
            ),
        ]),
    );

    presets.insert(
        "minimal".to_string(),
        BTreeMap::from([
            (
                ExportFormat::Csv,
                object(json!({ "include_bom": false, "escape_formulas": false })),
            ),
            (ExportFormat::Json, object(json!({ "pretty": false, "root_key": null }))),
            (ExportFormat::Txt, object(json!({ "border_char": "" }))),
        ]),
    );

    presets
}

// =============================================================================
// Merging
// =============================================================================

/// Apply a caller layer on top of a resolved config.
///
/// - Object over object: merged via [`merge_block`].
/// - Anything else (scalar, array, `null`, or an object where the default
///   isn't one): replaces the default.
pub fn merge_layer(base: &ConfigMap, overlay: &ConfigMap) -> ConfigMap {
    let mut merged = base.clone();
    for (key, value) in overlay {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(default_block)), Value::Object(custom_block)) => {
                Value::Object(merge_block(default_block, custom_block))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Merge one option block. Object entries inside the block are spread one
/// level (`{..default, ..custom}`); their own object children are replaced.
fn merge_block(default: &ConfigMap, custom: &ConfigMap) -> ConfigMap {
    let mut merged = default.clone();
    for (key, value) in custom {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(inner_default)), Value::Object(inner_custom)) => {
                let mut spread = inner_default.clone();
                spread.extend(inner_custom.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::Object(spread)
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Parse a `key=value` assignment as given on the command line.
///
/// The value is read as JSON when it parses (`true`, `9`, `[10,20]`,
/// `{"a":1}`) and kept as a plain string otherwise.
pub fn parse_assignment(input: &str) -> Result<(String, Value), String> {
    let (key, raw) = input
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(format!("invalid key in '{input}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Set a dotted path (`styles.header.bold`) inside a layer, creating
/// intermediate objects. A non-object in the way is replaced.
pub fn set_path(map: &mut ConfigMap, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(ConfigMap::new()));
            if !slot.is_object() {
                *slot = Value::Object(ConfigMap::new());
            }
            if let Value::Object(child) = slot {
                set_path(child, rest, value);
            }
        }
    }
}

// =============================================================================
// EffectiveConfig
// =============================================================================

/// Fully resolved configuration handed to an exporter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectiveConfig(ConfigMap);

impl EffectiveConfig {
    pub fn from_map(map: ConfigMap) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &ConfigMap {
        &self.0
    }

    pub fn into_map(self) -> ConfigMap {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Look up a dotted path such as `styles.normal.font_size`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = self.0.get(parts.next()?)?;
        parts.try_fold(first, |value, part| value.get(part))
    }

    /// Base filename from the global layer, falling back to `"export"`.
    pub fn filename(&self) -> &str {
        self.get_str("filename").unwrap_or("export")
    }

    pub fn include_timestamp(&self) -> bool {
        self.get_bool("include_timestamp").unwrap_or(true)
    }

    /// Decode into a typed view, e.g. [`PdfDefaults`]. Extra keys are ignored.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// A set of layers: global defaults, per-format templates and presets.
///
/// [`Registry::stock`] holds the shipped tables. User settings produce a
/// customised registry through the `with_*` builders (see
/// [`crate::config::ExportSettings::registry`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    global: ConfigMap,
    formats: BTreeMap<ExportFormat, ConfigMap>,
    presets: Presets,
}

impl Default for Registry {
    fn default() -> Self {
        Self::stock()
    }
}

impl Registry {
    pub fn stock() -> Self {
        Self {
            global: stock_global_defaults(),
            formats: ExportFormat::ALL
                .iter()
                .map(|&format| (format, stock_format_defaults(format)))
                .collect(),
            presets: builtin_presets(),
        }
    }

    /// Layer overrides onto the global defaults.
    pub fn with_global_overrides(mut self, overrides: &ConfigMap) -> Self {
        self.global = merge_layer(&self.global, overrides);
        self
    }

    /// Layer overrides onto one format's template.
    pub fn with_format_overrides(mut self, format: ExportFormat, overrides: &ConfigMap) -> Self {
        let template = self.formats.entry(format).or_default();
        *template = merge_layer(template, overrides);
        self
    }

    /// Register (or shadow) a preset for one format.
    pub fn with_preset(mut self, name: &str, format: ExportFormat, config: ConfigMap) -> Self {
        self.presets
            .entry(name.to_string())
            .or_default()
            .insert(format, config);
        self
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Formats a preset defines a layer for.
    pub fn preset_formats(&self, name: &str) -> Vec<ExportFormat> {
        self.presets
            .get(name)
            .map(|formats| formats.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Global defaults merged with the named format's template. Format keys
    /// win. An unknown format yields the global layer alone.
    pub fn format_defaults(&self, format: &str) -> EffectiveConfig {
        let mut config = self.global.clone();
        if let Some(template) = ExportFormat::parse(format).and_then(|f| self.formats.get(&f)) {
            config.extend(template.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        EffectiveConfig(config)
    }

    /// Format defaults with caller overrides applied via [`merge_layer`].
    pub fn merge(&self, format: &str, custom: &ConfigMap) -> EffectiveConfig {
        let defaults = self.format_defaults(format);
        EffectiveConfig(merge_layer(&defaults.0, custom))
    }

    /// Partial config for a preset and format; empty when either is unknown.
    pub fn preset(&self, preset: &str, format: &str) -> ConfigMap {
        ExportFormat::parse(format)
            .and_then(|f| self.presets.get(preset)?.get(&f))
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve all layers: global → format → preset → caller overrides.
    pub fn resolve(&self, format: &str, preset: Option<&str>, custom: &ConfigMap) -> EffectiveConfig {
        let mut config = self.format_defaults(format).0;
        if let Some(name) = preset {
            config = merge_layer(&config, &self.preset(name, format));
        }
        EffectiveConfig(merge_layer(&config, custom))
    }
}

static STOCK: LazyLock<Registry> = LazyLock::new(Registry::stock);

/// [`Registry::format_defaults`] on the stock registry.
pub fn get_format_defaults(format: &str) -> EffectiveConfig {
    STOCK.format_defaults(format)
}

/// [`Registry::merge`] on the stock registry.
pub fn merge_config(format: &str, custom: &ConfigMap) -> EffectiveConfig {
    STOCK.merge(format, custom)
}

/// [`Registry::preset`] on the stock registry.
pub fn get_preset_config(preset: &str, format: &str) -> ConfigMap {
    STOCK.preset(preset, format)
}

/// [`Registry::resolve`] on the stock registry.
pub fn resolve_config(format: &str, preset: Option<&str>, custom: &ConfigMap) -> EffectiveConfig {
    STOCK.resolve(format, preset, custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> ConfigMap {
        object(value)
    }

    // =========================================================================
    // get_format_defaults
    // =========================================================================

    #[test]
    fn format_defaults_include_global_keys() {
        let config = get_format_defaults("csv");
        assert_eq!(config.get_bool("auto_download"), Some(true));
        assert_eq!(config.get_str("filename"), Some("export"));
        assert_eq!(config.get_str("delimiter"), Some(","));
    }

    #[test]
    fn format_keys_win_over_global() {
        // Both layers define date_format; excel's spreadsheet pattern wins.
        let config = get_format_defaults("excel");
        assert_eq!(config.get_str("date_format"), Some("yyyy-mm-dd"));
    }

    #[test]
    fn unknown_format_yields_global_defaults() {
        let config = get_format_defaults("docx");
        assert_eq!(config.as_map(), &stock_global_defaults());
    }

    #[test]
    fn format_lookup_accepts_alias() {
        assert_eq!(get_format_defaults("xlsx"), get_format_defaults("excel"));
    }

    // =========================================================================
    // merge_config
    // =========================================================================

    #[test]
    fn empty_overrides_equal_format_defaults() {
        for name in ["csv", "json", "excel", "pdf", "txt", "unknown"] {
            assert_eq!(merge_config(name, &ConfigMap::new()), get_format_defaults(name));
        }
    }

    #[test]
    fn scalar_override_replaces() {
        let config = merge_config("csv", &map(json!({ "delimiter": ";" })));
        assert_eq!(config.get_str("delimiter"), Some(";"));
        assert_eq!(config.get_str("quote_char"), Some("\""));
    }

    #[test]
    fn array_override_replaces_whole_array() {
        let config = merge_config("pdf", &map(json!({ "page_margins": [10] })));
        assert_eq!(config.get("page_margins"), Some(&json!([10])));
    }

    #[test]
    fn null_override_replaces_block() {
        let config = merge_config("pdf", &map(json!({ "logo": null })));
        assert_eq!(config.get("logo"), Some(&Value::Null));
    }

    #[test]
    fn style_block_merges_and_keeps_siblings() {
        let config = merge_config(
            "pdf",
            &map(json!({ "styles": { "normal": { "font_size": 12 } } })),
        );
        assert_eq!(
            config.get_path("styles.normal.font_size"),
            Some(&json!(12))
        );
        assert_eq!(
            config.get_path("styles.normal.margin"),
            Some(&json!([0, 0, 0, 5]))
        );
        // Untouched sibling blocks survive.
        assert_eq!(config.get_path("styles.header.font_size"), Some(&json!(16)));
    }

    #[test]
    fn objects_below_block_entries_are_replaced() {
        let custom = map(json!({
            "styles": { "normal": { "font": { "family": "Courier" } } }
        }));
        let registry = Registry::stock().with_format_overrides(
            ExportFormat::Pdf,
            &map(json!({
                "styles": { "normal": { "font": { "family": "Helvetica", "size": 10 } } }
            })),
        );

        let config = registry.merge("pdf", &custom);
        assert_eq!(
            config.get_path("styles.normal.font"),
            Some(&json!({ "family": "Courier" }))
        );
    }

    #[test]
    fn object_override_for_scalar_default_is_inserted() {
        let config = merge_config("csv", &map(json!({ "delimiter": { "char": ";" } })));
        assert_eq!(config.get("delimiter"), Some(&json!({ "char": ";" })));
    }

    #[test]
    fn new_keys_are_added() {
        let config = merge_config("csv", &map(json!({ "columns": ["sku", "qty"] })));
        assert_eq!(config.get("columns"), Some(&json!(["sku", "qty"])));
    }

    #[test]
    fn merge_does_not_touch_stock_tables() {
        let before = get_format_defaults("pdf");
        let _ = merge_config("pdf", &map(json!({ "orientation": "landscape" })));
        assert_eq!(get_format_defaults("pdf"), before);
    }

    // =========================================================================
    // Presets
    // =========================================================================

    #[test]
    fn unknown_preset_is_empty() {
        assert!(get_preset_config("nonexistent", "csv").is_empty());
    }

    #[test]
    fn preset_without_format_layer_is_empty() {
        // "print" has no csv layer.
        assert!(get_preset_config("print", "csv").is_empty());
        assert!(get_preset_config("print", "docx").is_empty());
    }

    #[test]
    fn preset_lookup_returns_partial_config() {
        let preset = get_preset_config("print", "pdf");
        assert_eq!(preset.get("orientation"), Some(&json!("landscape")));
    }

    #[test]
    fn resolve_layers_preset_then_overrides() {
        let config = resolve_config(
            "pdf",
            Some("print"),
            &map(json!({ "page_margins": [0, 0, 0, 0] })),
        );
        assert_eq!(config.get_str("orientation"), Some("landscape"));
        assert_eq!(config.get("page_margins"), Some(&json!([0, 0, 0, 0])));
        // Preset style block merged into the defaults, not replacing them.
        assert_eq!(config.get_path("styles.normal.font_size"), Some(&json!(9)));
        assert_eq!(
            config.get_path("styles.normal.margin"),
            Some(&json!([0, 0, 0, 5]))
        );
        assert_eq!(config.get_path("logo.enabled"), Some(&json!(true)));
        assert_eq!(config.get_path("logo.max_width"), Some(&json!(150)));
    }

    #[test]
    fn resolve_with_unknown_preset_equals_merge() {
        let custom = map(json!({ "delimiter": "\t" }));
        assert_eq!(
            resolve_config("csv", Some("nope"), &custom),
            merge_config("csv", &custom)
        );
    }

    #[test]
    fn user_preset_shadows_builtin_per_format() {
        let registry = Registry::stock().with_preset(
            "print",
            ExportFormat::Pdf,
            map(json!({ "orientation": "portrait" })),
        );
        assert_eq!(
            registry.preset("print", "pdf").get("orientation"),
            Some(&json!("portrait"))
        );
        // The excel layer of the builtin preset is untouched.
        assert!(!registry.preset("print", "excel").is_empty());
    }

    // =========================================================================
    // Registry customisation and typed decoding
    // =========================================================================

    #[test]
    fn global_overrides_reach_every_format() {
        let registry =
            Registry::stock().with_global_overrides(&map(json!({ "filename": "inventory" })));
        for format in ExportFormat::ALL {
            assert_eq!(registry.format_defaults(format.name()).filename(), "inventory");
        }
    }

    #[test]
    fn decode_into_typed_defaults() {
        let config = merge_config(
            "pdf",
            &map(json!({ "styles": { "normal": { "font_size": 12 } } })),
        );
        let pdf: PdfDefaults = config.decode().unwrap();
        assert_eq!(pdf.styles.normal.font_size, 12);
        assert_eq!(pdf.styles.normal.margin, [0, 0, 0, 5]);
        assert_eq!(pdf.page_size, "A4");
    }

    #[test]
    fn every_preset_layer_decodes_into_its_format() {
        for (name, formats) in builtin_presets() {
            for format in formats.keys() {
                let config = resolve_config(format.name(), Some(&name), &ConfigMap::new());
                let decoded = match format {
                    ExportFormat::Csv => config.decode::<CsvDefaults>().map(|_| ()),
                    ExportFormat::Json => config.decode::<JsonDefaults>().map(|_| ()),
                    ExportFormat::Excel => config.decode::<ExcelDefaults>().map(|_| ()),
                    ExportFormat::Pdf => config.decode::<PdfDefaults>().map(|_| ()),
                    ExportFormat::Txt => config.decode::<TxtDefaults>().map(|_| ()),
                };
                assert!(decoded.is_ok(), "preset {name}/{format} does not decode");
            }
        }
    }

    #[test]
    fn get_path_handles_missing_segments() {
        let config = get_format_defaults("pdf");
        assert_eq!(config.get_path("styles.nope.font_size"), None);
        assert_eq!(config.get_path(""), None);
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    #[test]
    fn assignment_values_parse_as_json_or_string() {
        assert_eq!(parse_assignment("pretty=false").unwrap(), ("pretty".into(), json!(false)));
        assert_eq!(parse_assignment("indent=4").unwrap(), ("indent".into(), json!(4)));
        assert_eq!(
            parse_assignment("delimiter=;").unwrap(),
            ("delimiter".into(), json!(";"))
        );
        assert_eq!(
            parse_assignment("filename=a=b").unwrap(),
            ("filename".into(), json!("a=b"))
        );
    }

    #[test]
    fn assignment_rejects_missing_or_empty_keys() {
        assert!(parse_assignment("pretty").is_err());
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("styles..bold=1").is_err());
    }

    #[test]
    fn set_path_builds_nested_layer_that_merges_like_a_block() {
        let mut layer = ConfigMap::new();
        set_path(&mut layer, "styles.header.font_size", json!(20));
        set_path(&mut layer, "orientation", json!("landscape"));

        let config = merge_config("pdf", &layer);
        assert_eq!(config.get_path("styles.header.font_size"), Some(&json!(20)));
        assert_eq!(config.get_path("styles.header.bold"), Some(&json!(true)));
        assert_eq!(config.get_str("orientation"), Some("landscape"));
    }

    #[test]
    fn set_path_replaces_scalars_in_the_way() {
        let mut layer = map(json!({"styles": 3}));
        set_path(&mut layer, "styles.normal.font_size", json!(9));
        assert_eq!(layer["styles"], json!({"normal": {"font_size": 9}}));
    }
}
