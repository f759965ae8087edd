//! At-rest protection for stored credentials.
//!
//! The key lives in the same store as the ciphertext (`CONFIG.secret`). This
//! keeps passwords out of plain sight in the config file, but it does not
//! protect them from anyone who can read that file.
//!
//! Ciphertext format: URL-safe base64 (no padding) of `nonce[12] || ciphertext_with_tag`,
//! AES-256-GCM keyed with SHA-256 of the secret token.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::AppError;
use crate::store::{CONFIG_SECTION, ConfigStore};

pub const SECRET_KEY: &str = "secret";

const TOKEN_BYTES: usize = 32;
const NONCE_SIZE: usize = 12;

/// Generate `CONFIG.secret` if it does not exist yet or is blank. Idempotent.
pub fn ensure_secret(store: &ConfigStore) -> Result<(), AppError> {
    if store
        .get_opt(CONFIG_SECTION, SECRET_KEY)?
        .is_some_and(|token| !token.is_empty())
    {
        return Ok(());
    }
    let secret = Secret::generate();
    store.write([(
        CONFIG_SECTION,
        vec![(SECRET_KEY.to_string(), secret.token().to_string())],
    )])?;
    info!(path = %store.path().display(), "generated new store secret");
    Ok(())
}

/// Read `CONFIG.secret`; `ConfigIncomplete` if it was never generated or is blank.
pub fn load_secret(store: &ConfigStore) -> Result<Secret, AppError> {
    let token = store.get(CONFIG_SECTION, SECRET_KEY)?;
    if token.is_empty() {
        return Err(AppError::missing_key(CONFIG_SECTION, SECRET_KEY));
    }
    Ok(Secret::from_token(token))
}

#[derive(Clone)]
pub struct Secret {
    token: String,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl Secret {
    /// Fresh high-entropy URL-safe token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self {
            token: URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, AppError> {
        let cipher = self.cipher();

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| AppError::Encryption)?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Fails with `Decryption` when `encoded` was not produced under this secret.
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, AppError> {
        let data = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|_| AppError::Decryption)?;
        if data.len() <= NONCE_SIZE {
            return Err(AppError::Decryption);
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::Decryption)
    }

    fn cipher(&self) -> Aes256Gcm {
        let digest = Sha256::digest(self.token.as_bytes());
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&digest))
    }
}
