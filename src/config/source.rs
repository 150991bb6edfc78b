//! Raw key/value configuration.
//!
//! Values come from an optional TOML file at
//! `<config_dir>/lumina-calc/config.toml`, then from the environment, with
//! the environment winning. Only the keys in [`KNOWN_KEYS`] are read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const RELAY_URL: &str = "LUMINA_RELAY_URL";
pub const HISTORY_DB: &str = "LUMINA_HISTORY_DB";
pub const GMAIL_USER: &str = "GMAIL_USER";
pub const GMAIL_APP_PASSWORD: &str = "GMAIL_APP_PASSWORD";
pub const TO_EMAIL: &str = "TO_EMAIL";
pub const SMTP_HOST: &str = "SMTP_HOST";
pub const PORT: &str = "PORT";
pub const STATIC_DIR: &str = "LUMINA_STATIC_DIR";

pub const KNOWN_KEYS: &[&str] = &[
    GEMINI_API_KEY,
    GEMINI_MODEL,
    GEMINI_BASE_URL,
    RELAY_URL,
    HISTORY_DB,
    GMAIL_USER,
    GMAIL_APP_PASSWORD,
    TO_EMAIL,
    SMTP_HOST,
    PORT,
    STATIC_DIR,
];

const APP_DIR: &str = "lumina-calc";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    values: HashMap<String, String>,
}

impl ConfigSource {
    /// Config file (if present) overlaid with the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut source = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        for key in KNOWN_KEYS {
            if let Ok(value) = std::env::var(key) {
                debug!("Config key {} set from environment", key);
                source.set(key, value);
            }
        }

        Ok(source)
    }

    /// Read a flat TOML table. Strings, integers and booleans are accepted.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| file_error(e.to_string()))?;

        let mut source = Self::default();
        for (key, value) in table {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("Ignoring unknown config key '{}' in {:?}", key, path);
                continue;
            }
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(n) => n.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(file_error(format!(
                        "{} must be a string or number, got {}",
                        key,
                        other.type_str()
                    )))
                }
            };
            source.set(&key, value);
        }

        info!("Loaded config file {:?}", path);
        Ok(source)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::default();
        for (key, value) in pairs {
            let key = key.into();
            source.set(&key, value.into());
        }
        source
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    /// Trimmed value; blank counts as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
