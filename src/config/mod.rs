pub mod keychain;
pub mod source;

use std::path::PathBuf;

use tracing::{info, warn};
use url::Url;

use crate::error::{ConfigError, LuminaError};

pub use self::source::ConfigSource;
use self::source::{
    GEMINI_API_KEY, GEMINI_BASE_URL, GEMINI_MODEL, GMAIL_APP_PASSWORD, GMAIL_USER, HISTORY_DB,
    PORT, RELAY_URL, SMTP_HOST, STATIC_DIR, TO_EMAIL,
};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:8787";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_STATIC_DIR: &str = "dist";

/// Credentials and endpoint for the Gemini solver.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
}

/// Settings for the calculator front-end.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `None` when no API key was found; AI solves then fail fast.
    pub gemini: Option<GeminiConfig>,
    pub relay_url: Url,
    pub history_db: Option<PathBuf>,
}

impl ClientConfig {
    /// Config file plus environment, with the keychain as a fallback for
    /// the Gemini key.
    pub fn load() -> Result<Self, LuminaError> {
        let source = ConfigSource::load()?;
        let config = Self::from_source(&source, || {
            keychain::get_api_key(keychain::GEMINI_SERVICE).unwrap_or_else(|e| {
                warn!("Keychain lookup failed: {}", e);
                None
            })
        })?;
        Ok(config)
    }

    /// `stored_key` is only consulted when `GEMINI_API_KEY` is unset.
    pub fn from_source<F>(source: &ConfigSource, stored_key: F) -> Result<Self, ConfigError>
    where
        F: FnOnce() -> Option<String>,
    {
        let base_url = parse_http_url(
            GEMINI_BASE_URL,
            source.get_or(GEMINI_BASE_URL, DEFAULT_GEMINI_BASE_URL),
        )?;
        let relay_url = parse_http_url(RELAY_URL, source.get_or(RELAY_URL, DEFAULT_RELAY_URL))?;

        let api_key = match source.get(GEMINI_API_KEY) {
            Some(key) => Some(key.to_string()),
            None => stored_key().filter(|key| !key.trim().is_empty()),
        };

        let gemini = api_key.map(|api_key| GeminiConfig {
            api_key,
            model: source.get_or(GEMINI_MODEL, DEFAULT_GEMINI_MODEL).to_string(),
            base_url,
        });

        let config = Self {
            gemini,
            relay_url,
            history_db: source.get(HISTORY_DB).map(PathBuf::from),
        };
        info!(
            "Client config: relay={}, ai={}, history_db={:?}",
            config.relay_url,
            if config.gemini.is_some() { "configured" } else { "unavailable" },
            config.history_db
        );
        Ok(config)
    }
}

/// SMTP credentials for the relay's mail sender.
#[derive(Clone, PartialEq)]
pub struct MailConfig {
    pub user: String,
    pub app_password: String,
    pub to: String,
    pub smtp_host: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("user", &self.user)
            .field("app_password", &"<redacted>")
            .field("to", &self.to)
            .field("smtp_host", &self.smtp_host)
            .finish()
    }
}

/// Settings for the relay server.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    /// `None` when any mail credential is missing; `/send-result` then
    /// answers 500.
    pub mail: Option<MailConfig>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, LuminaError> {
        Ok(Self::from_source(&ConfigSource::load()?)?)
    }

    pub fn from_source(source: &ConfigSource) -> Result<Self, ConfigError> {
        let port = match source.get(PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: PORT,
                value: raw.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            static_dir: PathBuf::from(source.get_or(STATIC_DIR, DEFAULT_STATIC_DIR)),
            mail: mail_config(source),
        })
    }
}

fn mail_config(source: &ConfigSource) -> Option<MailConfig> {
    let required = [GMAIL_USER, GMAIL_APP_PASSWORD, TO_EMAIL];
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|key| source.get(key).is_none())
        .collect();

    if !missing.is_empty() {
        warn!("{}; result emails are disabled", ConfigError::Missing(missing));
        return None;
    }

    Some(MailConfig {
        user: source.get(GMAIL_USER)?.to_string(),
        app_password: source.get(GMAIL_APP_PASSWORD)?.to_string(),
        to: source.get(TO_EMAIL)?.to_string(),
        smtp_host: source.get_or(SMTP_HOST, DEFAULT_SMTP_HOST).to_string(),
    })
}

fn parse_http_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}
