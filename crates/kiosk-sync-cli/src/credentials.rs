//! Access key persistence in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use kiosk_sync_core::util::normalize_text_option;

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "kiosk-sync";
const ACCESS_KEY_ENV: &str = "KIOSK_SYNC_ACCESS_KEY";

#[derive(Clone)]
pub struct AccessKeyStore {
    username: String,
}

impl AccessKeyStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("access_key:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry, CliError> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| CliError::Credentials(error.to_string()))
    }

    #[cfg(not(test))]
    pub fn load(&self) -> Result<Option<String>, CliError> {
        match self.entry()?.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CliError::Credentials(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn load(&self) -> Result<Option<String>, CliError> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Credentials(error.to_string()))?;
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    pub fn save(&self, access_key: &str) -> Result<(), CliError> {
        self.entry()?
            .set_password(access_key)
            .map_err(|error| CliError::Credentials(error.to_string()))
    }

    #[cfg(test)]
    pub fn save(&self, access_key: &str) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Credentials(error.to_string()))?;
        guard.insert(self.username.clone(), access_key.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    pub fn clear(&self) -> Result<(), CliError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CliError::Credentials(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn clear(&self) -> Result<(), CliError> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| CliError::Credentials(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Stored access key for `profile_name`, falling back to `KIOSK_SYNC_ACCESS_KEY`
pub fn resolve_access_key(profile_name: &str) -> Result<Option<String>, CliError> {
    let stored = AccessKeyStore::new(profile_name).load()?;
    Ok(normalize_text_option(stored)
        .or_else(|| normalize_text_option(std::env::var(ACCESS_KEY_ENV).ok())))
}
