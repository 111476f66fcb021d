//! Cluster password lookup in the OS keyring.
//!
//! Passwords are never written to the history or the config file by
//! clusterdba; operators store them once with their platform keyring tool
//! under the service `clusterdba`.

use crate::error::{ConsoleError, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "clusterdba";

/// Read access to cluster passwords stored in the OS keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretStorage;

impl SecretStorage {
    /// Creates a new secret storage handle.
    pub fn new() -> Self {
        Self
    }

    /// Retrieves a secret from the keyring.
    ///
    /// A missing entry or an unavailable keyring yields `Ok(None)`.
    pub fn retrieve(&self, key: &str) -> Result<Option<String>> {
        let entry = match Entry::new(SERVICE_NAME, key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Keyring unavailable: {e}");
                return Ok(None);
            }
        };

        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::PlatformFailure(e)) | Err(keyring::Error::NoStorageAccess(e)) => {
                debug!("Keyring unavailable: {e}");
                Ok(None)
            }
            Err(e) => Err(ConsoleError::config(format!(
                "Failed to retrieve secret '{key}': {e}"
            ))),
        }
    }

    /// Generates a keyring key for a cluster password.
    pub fn cluster_password_key(cluster_name: &str) -> String {
        format!("cluster:{cluster_name}")
    }
}
