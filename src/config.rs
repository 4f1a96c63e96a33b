//! Engine configuration module.
//!
//! Handles loading, validating, and merging `mango.toml`. Stock defaults are
//! overridden by the user file; every key is optional.
//!
//! ## Config File Location
//!
//! `mango.toml` lives in the site's base directory. Relative paths inside it
//! are resolved against that directory:
//!
//! ```text
//! site/
//! ├── mango.toml
//! ├── .reload                # reload marker (optional)
//! ├── content/
//! │   ├── en/
//! │   └── lv/
//! └── public/
//!     ├── images/            # relocated image assets
//!     └── data/              # relocated data assets
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! content_path = "content"
//! public_path = "public"
//! collections = ["Tags", "Categories", "Keywords"]
//! reload_marker = ".reload"
//! file_url_prefix = "/"
//! image_extensions = ["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"]
//! data_extensions = ["pdf", "zip", "txt", "csv", "doc", "docx", "xls", "xlsx"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file inside the base directory.
pub const CONFIG_FILE: &str = "mango.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `mango.toml`.
///
/// Paths are stored as written until [`EngineConfig::resolve_paths`] anchors
/// them to a base directory; [`load_config`] does that for you.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root of the content tree.
    pub content_path: PathBuf,
    /// Destination root for relocated assets.
    pub public_path: PathBuf,
    /// Parameter names that feed collections, e.g. `Tags`.
    pub collections: Vec<String>,
    /// File whose existence forces page content to be re-read.
    pub reload_marker: PathBuf,
    /// Prefix for rewritten asset URLs in page content.
    pub file_url_prefix: String,
    /// Asset extensions relocated to `<public>/images/` (lowercase, no dot).
    pub image_extensions: Vec<String>,
    /// Asset extensions relocated to `<public>/data/` (lowercase, no dot).
    pub data_extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_path: "content".into(),
            public_path: "public".into(),
            collections: ["Tags", "Categories", "Keywords"]
                .into_iter()
                .map(String::from)
                .collect(),
            reload_marker: ".reload".into(),
            file_url_prefix: "/".into(),
            image_extensions: ["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"]
                .into_iter()
                .map(String::from)
                .collect(),
            data_extensions: ["pdf", "zip", "txt", "csv", "doc", "docx", "xls", "xlsx"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Stock configuration anchored at `base`.
    pub fn with_base(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    /// Anchor relative paths to `base`. Absolute paths are kept.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.content_path,
            &mut self.public_path,
            &mut self.reload_marker,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "content_path must not be empty".into(),
            ));
        }
        if self.public_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "public_path must not be empty".into(),
            ));
        }
        if self.reload_marker.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "reload_marker must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .collections
            .iter()
            .find(|name| name.trim().is_empty() || name.contains(','))
        {
            return Err(ConfigError::Validation(format!(
                "collection name {bad:?} must be non-empty and contain no commas"
            )));
        }
        Ok(())
    }

    /// Which public subdirectory an asset extension belongs to, if any.
    pub fn asset_bucket(&self, ext: &str) -> Option<&'static str> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        if self.image_extensions.contains(&ext) {
            Some("images")
        } else if self.data_extensions.contains(&ext) {
            Some("data")
        } else {
            None
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EngineConfig::default()).expect("default config must serialize")
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

/// Load `mango.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `mango.toml` in `base` and anchor its paths there.
pub fn load_config(base: &Path) -> Result<EngineConfig, ConfigError> {
    let overlay = load_raw_config(base)?;
    let mut config = resolve_config(stock_defaults_value(), overlay)?;
    config.resolve_paths(base);
    Ok(config)
}

/// Returns a fully-commented stock `mango.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Mango Configuration
# ===================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory holding this file.
# Unknown keys will cause an error.

# Root of the content tree. Each top-level directory is usually a language
# (en/, lv/, ...), and its last two characters become the page language.
content_path = "content"

# Where static assets found in the content tree are copied to.
public_path = "public"

# Page parameters that feed collections. A page with "Tags: a, b" is listed
# under the keys "a" and "b" of the Tags collection.
collections = ["Tags", "Categories", "Keywords"]

# While this file exists, page content is re-read from disk on every access.
reload_marker = ".reload"

# Prefix for rewritten src="images/..." and href="data/..." references.
file_url_prefix = "/"

# Assets copied to <public_path>/images/
image_extensions = ["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"]

# Assets copied to <public_path>/data/
data_extensions = ["pdf", "zip", "txt", "csv", "doc", "docx", "xls", "xlsx"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.content_path, PathBuf::from("content"));
        assert_eq!(config.public_path, PathBuf::from("public"));
        assert_eq!(config.collections, vec!["Tags", "Categories", "Keywords"]);
        assert_eq!(config.reload_marker, PathBuf::from(".reload"));
        assert_eq!(config.file_url_prefix, "/");
    }

    #[test]
    fn parse_partial_config() {
        let config: EngineConfig = toml::from_str(r#"collections = ["Tags"]"#).unwrap();
        assert_eq!(config.collections, vec!["Tags"]);
        assert_eq!(config.content_path, PathBuf::from("content"));
        assert!(config.image_extensions.contains(&"png".to_string()));
    }

    #[test]
    fn unknown_keys_rejected() {
        let result: Result<EngineConfig, _> = toml::from_str("colections = []");
        assert!(result.is_err());
    }

    #[test]
    fn asset_buckets() {
        let config = EngineConfig::default();
        assert_eq!(config.asset_bucket("PNG"), Some("images"));
        assert_eq!(config.asset_bucket(".pdf"), Some("data"));
        assert_eq!(config.asset_bucket("exe"), None);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.content_path, tmp.path().join("content"));
        assert_eq!(config.reload_marker, tmp.path().join(".reload"));
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "content_path = \"pages\"\nfile_url_prefix = \"https://cdn.example.com/\"\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.content_path, tmp.path().join("pages"));
        assert_eq!(config.file_url_prefix, "https://cdn.example.com/");
        assert_eq!(config.public_path, tmp.path().join("public"));
    }

    #[test]
    fn absolute_paths_kept() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            format!("public_path = {:?}\n", elsewhere.path().to_string_lossy()),
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.public_path, elsewhere.path());
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn comma_in_collection_name_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), r#"collections = ["Tags,Cats"]"#).unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn empty_content_path_rejected() {
        let config = EngineConfig {
            content_path: PathBuf::new(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_overlay_wins() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_arrays_replaced() {
        let base: toml::Value = toml::from_str(r#"c = ["x", "y"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"c = ["z"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["c"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let parsed: EngineConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = EngineConfig::default();
        assert_eq!(parsed.collections, defaults.collections);
        assert_eq!(parsed.image_extensions, defaults.image_extensions);
        assert_eq!(parsed.data_extensions, defaults.data_extensions);
        parsed.validate().unwrap();
    }
}
