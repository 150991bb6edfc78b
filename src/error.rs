use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuminaError {
    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("History error: {0}")]
    History(String),
}

/// Problems found while building a configuration object at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL for {key}: {value} ({reason})")]
    InvalidUrl {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("missing required key(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("failed to read config file {path}: {reason}")]
    File { path: String, reason: String },
}

impl From<LuminaError> for String {
    fn from(err: LuminaError) -> Self {
        err.to_string()
    }
}
