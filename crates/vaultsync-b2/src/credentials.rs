//! Application key storage
//!
//! Keeps the B2 application key out of the configuration file by storing it
//! in the OS credential store (GNOME Keyring, KDE Wallet, macOS Keychain).

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Keyring service name for storing application keys
const KEYRING_SERVICE: &str = "vaultsync";

/// Stores and retrieves application keys from the system keyring
///
/// Entries use the service name "vaultsync" and the application key ID as
/// the username, so several keys can coexist.
pub struct KeyringKeyStorage;

impl KeyringKeyStorage {
    /// Stores the application key for `key_id`
    pub fn store(key_id: &str, application_key: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, key_id)
            .context("Failed to create keyring entry")?;

        entry
            .set_password(application_key)
            .context("Failed to store application key in keyring")?;

        info!("Stored application key in keyring for key ID: {}", key_id);
        Ok(())
    }

    /// Loads the application key for `key_id`, if one is stored
    pub fn load(key_id: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, key_id)
            .context("Failed to create keyring entry")?;

        match entry.get_password() {
            Ok(key) => {
                debug!("Loaded application key from keyring for key ID: {}", key_id);
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No application key in keyring for key ID: {}", key_id);
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    /// Removes the application key for `key_id`; a missing entry is not an error
    pub fn clear(key_id: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, key_id)
            .context("Failed to create keyring entry")?;

        match entry.delete_credential() {
            Ok(()) => {
                info!("Cleared application key from keyring for key ID: {}", key_id);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No application key to clear for key ID: {}", key_id);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}
