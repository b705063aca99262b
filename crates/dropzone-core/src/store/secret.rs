use anyhow::{Context, Result};
use keyring::Entry;
use rand::RngCore;
use tracing::info;

use super::cipher::MIN_SECRET_LEN;

const SERVICE_NAME: &str = "dropzone-admin";

/// Keychain entry holding the session-store secret
const SESSION_SECRET_ENTRY: &str = "session-secret";

/// Secret used to derive the session-store key, kept in the OS keychain
/// when not supplied through the environment.
pub struct SecretStore;

impl SecretStore {
    /// Return the configured secret, or the keychain one (created on first use)
    pub fn session_secret(configured: Option<&str>) -> Result<Vec<u8>> {
        if let Some(secret) = configured {
            if secret.len() < MIN_SECRET_LEN {
                anyhow::bail!("Session secret must be at least {} bytes", MIN_SECRET_LEN);
            }
            return Ok(secret.as_bytes().to_vec());
        }

        let entry = Entry::new(SERVICE_NAME, SESSION_SECRET_ENTRY)
            .context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(secret) if secret.len() >= MIN_SECRET_LEN => Ok(secret.into_bytes()),
            _ => {
                let secret = Self::generate();
                entry
                    .set_password(&secret)
                    .context("Failed to store session secret in keychain")?;
                info!("Generated new session secret in keychain");
                Ok(secret.into_bytes())
            }
        }
    }

    fn generate() -> String {
        let mut bytes = [0u8; MIN_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
