use argon2::Argon2;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use super::StoreError;

/// Minimum accepted length of the server secret
pub const MIN_SECRET_LEN: usize = 32;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Authenticated encryption for session records.
///
/// Sealed layout is `nonce || ciphertext || tag`. The associated data binds a
/// record to the cookie it was written under.
pub struct SessionCipher {
    cipher: ChaCha20Poly1305,
}

impl SessionCipher {
    /// Derive the record key from the server secret with Argon2id.
    pub fn derive(secret: &[u8], salt: &[u8]) -> Result<Self, StoreError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(StoreError::WeakSecret { min: MIN_SECRET_LEN });
        }

        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(secret, salt, &mut key)
            .map_err(|e| StoreError::KeyDerivation(e.to_string()))?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        key.fill(0);
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, StoreError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, Payload { msg: plaintext, aad: associated_data })
            .map_err(|_| StoreError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, StoreError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(StoreError::Tampered);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad: associated_data })
            .map_err(|_| StoreError::Tampered)
    }
}
