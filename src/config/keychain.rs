use keyring::Entry;
use tracing::{info, warn};

use crate::error::LuminaError;

/// Keychain service holding the Gemini API key.
pub const GEMINI_SERVICE: &str = "lumina-gemini-api";
const KEYCHAIN_USER: &str = "lumina";

fn entry(service: &str) -> Result<Entry, LuminaError> {
    Entry::new(service, KEYCHAIN_USER).map_err(|e| {
        warn!("Failed to create keyring entry for {}: {}", service, e);
        LuminaError::Keychain(e.to_string())
    })
}

pub fn set_api_key(service: &str, key: &str) -> Result<(), LuminaError> {
    info!("Setting API key for service: {}", service);
    entry(service)?.set_password(key).map_err(|e| {
        warn!("Failed to set password for {}: {}", service, e);
        LuminaError::Keychain(e.to_string())
    })
}

pub fn get_api_key(service: &str) -> Result<Option<String>, LuminaError> {
    match entry(service)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            info!("No API key found for service: {}", service);
            Ok(None)
        }
        Err(e) => {
            warn!("Failed to get password for {}: {}", service, e);
            Err(LuminaError::Keychain(e.to_string()))
        }
    }
}

pub fn delete_api_key(service: &str) -> Result<(), LuminaError> {
    info!("Deleting API key for service: {}", service);
    match entry(service)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => {
            warn!("Failed to delete credential for {}: {}", service, e);
            Err(LuminaError::Keychain(e.to_string()))
        }
    }
}
