//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it, so
//! a config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! ```text
//! docs/
//! ├── config.toml        # Site config (optional)
//! ├── template.html      # Page template (optional, built-in otherwise)
//! ├── public/            # Static files copied verbatim to the output root
//! ├── index.md
//! ├── 1-intro.md
//! └── 2-usage.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! site_title = "Documentation"   # Title shown for the index document
//! site_name = ""                 # Substituted for <!-- SITE_NAME -->
//! base_url = "/"                 # Prefix for root-relative links
//! routing = "flat"               # "flat" (name.html) or "nested" (name/index.html)
//! index_document = "index"       # Base name of the site's landing document
//! default_author = "Anonymous"
//! description_length = 200       # Max characters of a derived description
//! timestamps = "none"            # "none", "filesystem" or "git"
//!
//! [toc]
//! enabled = true
//! after_level = 1                # Insert the TOC after the first h1 (or h2)
//! max_depth = 6                  # Deepest heading level listed
//!
//! [markdown]
//! footnotes = true
//!
//! [processing]
//! max_processes = 4              # Max parallel renderers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How document base names map to output paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Routing {
    /// `intro.md` → `intro.html`
    #[default]
    Flat,
    /// `intro.md` → `intro/index.html`
    Nested,
}

/// Where per-document creation/modification instants come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// Every document is stamped with the build time.
    #[default]
    None,
    /// File modification time for both fields.
    Filesystem,
    /// First and last commit touching the file.
    Git,
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Title displayed for the index document in navigation.
    pub site_title: String,
    /// Free-form site name for the `SITE_NAME` placeholder.
    pub site_name: String,
    /// Path prefix inserted into every root-relative URL.
    pub base_url: String,
    /// Output layout.
    pub routing: Routing,
    /// Base name (without extension) of the document served at the site root.
    pub index_document: String,
    /// Author used when a document does not declare one.
    pub default_author: String,
    /// Maximum length of a description derived from page content.
    pub description_length: usize,
    /// Timestamp source for `CREATED_AT` / `MODIFIED_AT`.
    pub timestamps: TimestampMode,
    /// Table of contents generation.
    pub toc: TocConfig,
    /// Markdown extensions.
    pub markdown: MarkdownConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "Documentation".to_string(),
            site_name: String::new(),
            base_url: "/".to_string(),
            routing: Routing::default(),
            index_document: "index".to_string(),
            default_author: "Anonymous".to_string(),
            description_length: 200,
            timestamps: TimestampMode::default(),
            toc: TocConfig::default(),
            markdown: MarkdownConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=2).contains(&self.toc.after_level) {
            return Err(ConfigError::Validation(
                "toc.after_level must be 1 or 2".into(),
            ));
        }
        if !(1..=6).contains(&self.toc.max_depth) {
            return Err(ConfigError::Validation(
                "toc.max_depth must be 1-6".into(),
            ));
        }
        if self.description_length == 0 {
            return Err(ConfigError::Validation(
                "description_length must be non-zero".into(),
            ));
        }
        if self.index_document.trim().is_empty() {
            return Err(ConfigError::Validation(
                "index_document must not be empty".into(),
            ));
        }
        if !self.base_url.starts_with('/') {
            return Err(ConfigError::Validation(
                "base_url must start with '/'".into(),
            ));
        }
        Ok(())
    }
}

/// Table of contents settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TocConfig {
    /// Whether the marker heading is injected and a TOC generated.
    pub enabled: bool,
    /// Heading level after which the marker is inserted (1 or 2).
    pub after_level: u8,
    /// Deepest heading level included in the TOC.
    pub max_depth: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            after_level: 1,
            max_depth: 6,
        }
    }
}

/// Markdown extension toggles beyond the always-on GFM set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Expand `[^note]` footnote syntax.
    pub footnotes: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { footnotes: true }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel page renderers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never below one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge user values on top of stock defaults, reject unknown keys, validate.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(dir)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docsite configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# Title shown for the index document in navigation and pagers.
site_title = "Documentation"

# Substituted for <!-- SITE_NAME --> in the template.
site_name = ""

# Path prefix inserted into every root-relative src/href/url().
# Use "/blog/" when the site is served from https://example.com/blog/.
base_url = "/"

# "flat":   intro.md -> intro.html
# "nested": intro.md -> intro/index.html
routing = "flat"

# Base name of the document served at the site root.
index_document = "index"

# Author used when a document's metadata block does not name one.
default_author = "Anonymous"

# Maximum characters of a description derived from page content.
description_length = 200

# Source of CREATED_AT / MODIFIED_AT: "none" (build time), "filesystem", "git".
timestamps = "none"

# ---------------------------------------------------------------------------
# Table of contents
# ---------------------------------------------------------------------------
[toc]
enabled = true
# Insert the "Table of contents" heading after the first heading of this level.
after_level = 1
# Deepest heading level listed in the TOC.
max_depth = 6

# ---------------------------------------------------------------------------
# Markdown
# ---------------------------------------------------------------------------
[markdown]
footnotes = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel page renderers. Omit to auto-detect.
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.site_title, "Documentation");
        assert_eq!(config.base_url, "/");
        assert_eq!(config.routing, Routing::Flat);
        assert_eq!(config.default_author, "Anonymous");
        assert_eq!(config.description_length, 200);
        assert!(config.toc.enabled);
        assert_eq!(config.toc.after_level, 1);
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
base_url = "/blog/"
routing = "nested"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "/blog/");
        assert_eq!(config.routing, Routing::Nested);
        // Defaults preserved
        assert_eq!(config.site_title, "Documentation");
        assert_eq!(config.toc.max_depth, 6);
    }

    #[test]
    fn parse_timestamp_mode() {
        let config: SiteConfig = toml::from_str(r#"timestamps = "git""#).unwrap();
        assert_eq!(config.timestamps, TimestampMode::Git);
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(r#"site_tilte = "typo""#);
        assert!(result.is_err());
    }

    #[test]
    fn merge_preserves_unrelated_keys() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[toc]\nmax_depth = 3").unwrap();
        let merged: SiteConfig = merge_toml(base, overlay).try_into().unwrap();
        assert_eq!(merged.toc.max_depth, 3);
        assert!(merged.toc.enabled);
        assert_eq!(merged.toc.after_level, 1);
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.site_title, defaults.site_title);
        assert_eq!(config.base_url, defaults.base_url);
        assert_eq!(config.routing, defaults.routing);
        assert_eq!(config.toc.max_depth, defaults.toc.max_depth);
        assert_eq!(config.processing.max_processes, None);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_rejects_bad_toc_level() {
        let mut config = SiteConfig::default();
        config.toc.after_level = 3;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_relative_base_url() {
        let config = SiteConfig {
            base_url: "blog/".to_string(),
            ..SiteConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_description_length() {
        let config = SiteConfig {
            description_length: 0,
            ..SiteConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site_title, "Documentation");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
site_title = "Handbook"

[markdown]
footnotes = false
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site_title, "Handbook");
        assert!(!config.markdown.footnotes);
        assert_eq!(config.default_author, "Anonymous");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[toc]\nmax_depth = 9").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
