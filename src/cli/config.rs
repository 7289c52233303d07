//! Configuration file handling for storeshot
//!
//! Manages configuration stored in `~/.config/storeshot/config.toml` (or
//! platform equivalent).
//!
//! ## Configuration Layers
//!
//! The data directory is resolved in this order (later overrides earlier):
//! 1. Hard-coded default (`<config dir>/storeshot`)
//! 2. Config file `[storage] data_dir`
//! 3. `STORESHOT_DATA_DIR` environment variable
//! 4. `--data-dir` command-line argument
//!
//! ## Example Config File
//!
//! ```toml
//! version = 1
//!
//! [storage]
//! data_dir = "/home/me/.local/share/storeshot"
//!
//! [output]
//! default_format = "json"
//!
//! [render]
//! default_device = "iphone-15-pro"
//! default_preset = "dark"
//!
//! [license]
//! purchase_url = "https://example.com/buy"
//! manage_url = "https://example.com/account"
//! ```

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::catalog;
use crate::entitlements::LicenseLinks;

pub const APP_DIR: &str = "storeshot";
pub const DATA_DIR_ENV: &str = "STORESHOT_DATA_DIR";

// Bump when making breaking changes to the config structure
const CONFIG_VERSION: u32 = 1;
const LEGACY_CONFIG_VERSION: u32 = 0;

// =============================================================================
// Configuration Structures
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreshotConfig {
    /// Config file format version for migrations
    #[serde(default = "default_config_version")]
    pub version: u32,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub license: LicenseConfig,
}

fn default_config_version() -> u32 {
    LEGACY_CONFIG_VERSION
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where `subscription.json` and `usage.json` live (None = default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// human or json
    #[serde(default = "default_format")]
    pub default_format: String,
}

/// Fallbacks for `generate` and `batch` when the command line names none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_device: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseConfig {
    #[serde(default = "default_purchase_url")]
    pub purchase_url: String,

    #[serde(default = "default_manage_url")]
    pub manage_url: String,
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_format() -> String {
    "human".to_string()
}

fn default_purchase_url() -> String {
    LicenseLinks::default().purchase_url
}

fn default_manage_url() -> String {
    LicenseLinks::default().manage_url
}

fn normalize_format(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "human" | "text" | "plain" => "human".to_string(),
        "json" => "json".to_string(),
        other => other.to_string(),
    }
}

impl Default for StoreshotConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
            render: RenderConfig::default(),
            license: LicenseConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            purchase_url: default_purchase_url(),
            manage_url: default_manage_url(),
        }
    }
}

impl LicenseConfig {
    pub fn links(&self) -> LicenseLinks {
        LicenseLinks {
            purchase_url: self.purchase_url.clone(),
            manage_url: self.manage_url.clone(),
        }
    }
}

// =============================================================================
// Configuration Loading and Saving
// =============================================================================

impl StoreshotConfig {
    /// Platform config directory joined with `storeshot/config.toml`.
    pub fn default_path() -> PathBuf {
        default_app_dir().join("config.toml")
    }

    /// Load configuration from `path`.
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed, and
    /// rewrites the file when an older version was migrated.
    pub fn load_from(path: PathBuf) -> Self {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                tracing::debug!("Config file not found at {:?}, using defaults", path);
                return Self::default();
            }
        };

        let mut config = match toml::from_str::<Self>(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                return Self::default();
            }
        };
        tracing::debug!("Loaded config from {:?}", path);

        let original_version = config.version;
        config.migrate_if_needed();

        if config.version != original_version {
            tracing::info!(
                "Config migrated from version {} to {}",
                original_version,
                config.version
            );
            if let Err(e) = config.save_to(path.clone()) {
                tracing::warn!("Failed to persist migrated config {:?}: {}", path, e);
            }
        }
        config
    }

    fn migrate_if_needed(&mut self) {
        match self.version {
            0 => {
                // v0 accepted free-form output names and unchecked catalog ids
                self.output.default_format = normalize_format(&self.output.default_format);
                if !matches!(self.output.default_format.as_str(), "human" | "json") {
                    self.output.default_format = default_format();
                }
                if let Some(device) = &self.render.default_device {
                    if catalog::find_device(device).is_none() {
                        tracing::info!("Migrating config: dropping unknown device {}", device);
                        self.render.default_device = None;
                    }
                }
                if let Some(preset) = &self.render.default_preset {
                    if catalog::find_preset(preset).is_none() {
                        tracing::info!("Migrating config: dropping unknown preset {}", preset);
                        self.render.default_preset = None;
                    }
                }
                self.version = CONFIG_VERSION;
            }
            CONFIG_VERSION => {}
            _ => {
                tracing::warn!(
                    "Config version {} is newer than supported version {}. Some settings may be ignored.",
                    self.version,
                    CONFIG_VERSION
                );
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&path, content)?;
        tracing::debug!("Saved config to {:?}", path);

        Ok(())
    }

    /// Pick the data directory: CLI flag, then `env_override`, then the
    /// config file, then the platform default.
    pub fn resolve_data_dir(
        &self,
        cli_override: Option<&Path>,
        env_override: Option<OsString>,
    ) -> PathBuf {
        if let Some(dir) = cli_override {
            return dir.to_path_buf();
        }
        if let Some(dir) = env_override.filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(default_app_dir)
    }

    // =========================================================================
    // Dotted keys
    // =========================================================================

    /// Get a configuration value by key path, e.g. `output.default_format`.
    /// Unset optional values read as an empty string.
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["storage", "data_dir"] => Some(
                self.storage
                    .data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            ["output", "default_format"] => Some(self.output.default_format.clone()),
            ["render", "default_device"] => {
                Some(self.render.default_device.clone().unwrap_or_default())
            }
            ["render", "default_preset"] => {
                Some(self.render.default_preset.clone().unwrap_or_default())
            }
            ["license", "purchase_url"] => Some(self.license.purchase_url.clone()),
            ["license", "manage_url"] => Some(self.license.manage_url.clone()),
            _ => None,
        }
    }

    /// Set a configuration value by key path. An empty value clears optional
    /// settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = key.split('.').collect();
        let value = value.trim();
        let invalid = |expected: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        };

        match parts.as_slice() {
            ["storage", "data_dir"] => {
                self.storage.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ["output", "default_format"] => {
                let normalized = normalize_format(value);
                if !matches!(normalized.as_str(), "human" | "json") {
                    return Err(invalid("human or json"));
                }
                self.output.default_format = normalized;
            }
            ["render", "default_device"] => {
                if value.is_empty() {
                    self.render.default_device = None;
                } else if catalog::find_device(value).is_some() {
                    self.render.default_device = Some(value.to_string());
                } else {
                    return Err(invalid(&catalog_ids(catalog::DEVICES.iter().map(|d| d.id))));
                }
            }
            ["render", "default_preset"] => {
                if value.is_empty() {
                    self.render.default_preset = None;
                } else if catalog::find_preset(value).is_some() {
                    self.render.default_preset = Some(value.to_string());
                } else {
                    return Err(invalid(&catalog_ids(catalog::PRESETS.iter().map(|p| p.id))));
                }
            }
            ["license", "purchase_url"] => {
                if !is_http_url(value) {
                    return Err(invalid("an http(s) URL"));
                }
                self.license.purchase_url = value.to_string();
            }
            ["license", "manage_url"] => {
                if !is_http_url(value) {
                    return Err(invalid("an http(s) URL"));
                }
                self.license.manage_url = value.to_string();
            }
            _ => {
                return Err(ConfigError::UnknownKey(key.to_string()));
            }
        }

        Ok(())
    }

    /// List all configuration keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        KEYS.iter()
            .map(|key| (key.to_string(), self.get(key).unwrap_or_default()))
            .collect()
    }
}

const KEYS: &[&str] = &[
    "storage.data_dir",
    "output.default_format",
    "render.default_device",
    "render.default_preset",
    "license.purchase_url",
    "license.manage_url",
];

fn default_app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn catalog_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    format!("one of {}", ids.collect::<Vec<_>>().join(", "))
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: '{value}' (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StoreshotConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.output.default_format, "human");
        assert_eq!(config.render.default_device, None);
        assert_eq!(config.license.links(), LicenseLinks::default());
    }

    #[test]
    fn test_config_path() {
        let path = StoreshotConfig::default_path();
        assert!(path.to_string_lossy().contains(APP_DIR));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");

        let mut config = StoreshotConfig::default();
        config.set("output.default_format", "json").unwrap();
        config.set("render.default_preset", "dark").unwrap();
        config.save_to(config_path.clone()).unwrap();

        let loaded = StoreshotConfig::load_from(config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_or_garbage() {
        let config = StoreshotConfig::load_from(PathBuf::from("/nonexistent/config.toml"));
        assert_eq!(config, StoreshotConfig::default());

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert_eq!(StoreshotConfig::load_from(path), StoreshotConfig::default());
    }

    #[test]
    fn test_unversioned_config_migrates() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("legacy.toml");
        let legacy = r#"
[output]
default_format = "Text"

[render]
default_device = "pixel-8"
default_preset = "green"
"#;
        std::fs::write(&config_path, legacy).unwrap();

        let loaded = StoreshotConfig::load_from(config_path.clone());
        assert_eq!(loaded.version, CONFIG_VERSION);
        assert_eq!(loaded.output.default_format, "human");
        assert_eq!(loaded.render.default_device, None);
        assert_eq!(loaded.render.default_preset.as_deref(), Some("green"));

        let rewritten = std::fs::read_to_string(config_path).unwrap();
        assert!(rewritten.contains("version = 1"));
    }

    #[test]
    fn test_get_and_set() {
        let mut config = StoreshotConfig::default();
        assert_eq!(config.get("render.default_device"), Some(String::new()));

        config.set("render.default_device", "ipad-air").unwrap();
        assert_eq!(config.get("render.default_device"), Some("ipad-air".to_string()));

        config.set("render.default_device", "").unwrap();
        assert_eq!(config.render.default_device, None);

        config.set("storage.data_dir", "/tmp/shots").unwrap();
        assert_eq!(config.get("storage.data_dir"), Some("/tmp/shots".to_string()));

        assert_eq!(config.get("invalid.key"), None);
    }

    #[test]
    fn test_set_invalid_values() {
        let mut config = StoreshotConfig::default();
        assert!(matches!(
            config.set("output.default_format", "csv"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config.set("render.default_preset", "teal").is_err());
        assert!(config.set("license.purchase_url", "ftp://nope").is_err());
        assert!(matches!(
            config.set("unknown.key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = StoreshotConfig::default();
        let items = config.list();
        assert_eq!(items.len(), KEYS.len());
        for (key, _) in &items {
            assert!(config.get(key).is_some(), "{key}");
        }
    }

    #[test]
    fn test_data_dir_precedence() {
        let mut config = StoreshotConfig::default();
        assert!(config.resolve_data_dir(None, None).ends_with(APP_DIR));

        config.storage.data_dir = Some(PathBuf::from("/from/config"));
        assert_eq!(config.resolve_data_dir(None, None), PathBuf::from("/from/config"));
        assert_eq!(
            config.resolve_data_dir(None, Some(OsString::from("/from/env"))),
            PathBuf::from("/from/env")
        );
        assert_eq!(
            config.resolve_data_dir(None, Some(OsString::new())),
            PathBuf::from("/from/config")
        );
        assert_eq!(
            config.resolve_data_dir(
                Some(Path::new("/from/flag")),
                Some(OsString::from("/from/env"))
            ),
            PathBuf::from("/from/flag")
        );
    }
}
