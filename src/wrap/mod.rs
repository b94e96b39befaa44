//! Password-based secret wrapping for key material at rest.
//!
//! ```text
//! key     = PBKDF2-HMAC-SHA256(password, salt(16), 600_000, 32)
//! wrapped = b64url(nonce(12) || AES-256-GCM(key, nonce, secret))
//! salt    = b64url(salt)
//! ```
//!
//! The iteration count is fixed; derivation takes hundreds of milliseconds, so
//! callers that need responsiveness should run it on a worker thread.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::{fill_random, random_nonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{Result, SealError};
use crate::util::{b64, b64d};

/// PBKDF2 iteration count. Not configurable.
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Salt drawn for every wrap.
const SALT_SIZE: usize = 16;

/// Shortest salt accepted when unwrapping.
const MIN_SALT_SIZE: usize = 8;

/// Shortest decoded blob: nonce plus tag of an empty secret.
const MIN_WRAPPED_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// A wrapped secret. Both fields must be stored together.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WrappedSecret {
    /// b64url(nonce || ciphertext || tag).
    pub wrapped: String,
    /// b64url(PBKDF2 salt).
    pub salt: String,
}

fn derive_wrapping_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut());
    key
}

/// Encrypt `secret` under a key derived from `password`.
pub fn wrap_secret(secret: &str, password: &str) -> Result<WrappedSecret> {
    if secret.is_empty() || password.is_empty() {
        return Err(SealError::invalid_key("empty secret or password"));
    }

    let mut salt = [0u8; SALT_SIZE];
    fill_random(&mut salt)?;
    let key = derive_wrapping_key(password, &salt);

    let nonce = random_nonce()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), secret.as_bytes())
        .map_err(|_| SealError::KeyWrapFailed)?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);

    Ok(WrappedSecret {
        wrapped: b64(&blob),
        salt: b64(&salt),
    })
}

/// Recover a secret produced by [`wrap_secret`].
///
/// A wrong password and a corrupted blob both yield `KeyUnwrapFailed`.
pub fn unwrap_secret(wrapped: &str, salt: &str, password: &str) -> Result<Zeroizing<String>> {
    if wrapped.is_empty() || salt.is_empty() || password.is_empty() {
        return Err(SealError::invalid_key("empty wrapped secret, salt or password"));
    }

    let blob = b64d(wrapped).map_err(|e| SealError::invalid_record_from("bad wrapped key", e))?;
    if blob.len() < MIN_WRAPPED_SIZE {
        return Err(SealError::invalid_record("wrapped key too short"));
    }
    let salt = b64d(salt).map_err(|e| SealError::invalid_record_from("bad salt", e))?;
    if salt.len() < MIN_SALT_SIZE {
        return Err(SealError::invalid_record("salt too short"));
    }

    let key = derive_wrapping_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    let plain = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SealError::KeyUnwrapFailed)?,
    );

    let secret = std::str::from_utf8(&plain)
        .map_err(|_| SealError::invalid_record("wrapped secret is not utf-8"))?;
    Ok(Zeroizing::new(secret.to_owned()))
}
