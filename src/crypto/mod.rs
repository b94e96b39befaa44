//! Crypto module: protocol constants and the stateless primitive helpers shared by
//! the envelope engine and the secret wrapper.
//!
//! Everything here is a free function over explicit buffers. Randomness always
//! comes from the OS generator and a failed draw aborts the caller.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, SealError};

/// Envelope protocol version written to records, headers and the token prefix.
pub const VERSION: u32 = 1;

/// Algorithm suite identifier carried in the token header for [`VERSION`].
pub const ALG: &str = "X25519-HKDF-SHA256-ChaCha20Poly1305";

/// HKDF info label binding the KEK to this protocol version.
pub const KEK_INFO_LABEL: &[u8] = b"goseal v1 kek";

/// Size of X25519 scalars and points, DEKs and KEKs.
pub const KEY_SIZE: usize = 32;

/// ChaCha20-Poly1305 / AES-GCM nonce size.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 / GCM tag size appended to every AEAD ciphertext.
pub const TAG_SIZE: usize = 16;

/// A DEK sealed under the KEK: 32 bytes of key plus the tag.
pub const WRAPPED_DEK_SIZE: usize = KEY_SIZE + TAG_SIZE;

/// Fill `buf` from the OS randomness source.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(SealError::RandomSource)
}

/// Draw a fresh random nonce.
pub fn random_nonce() -> Result<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;
    Ok(nonce)
}

/// Draw a fresh random 32-byte key into a zeroizing buffer.
pub fn random_key() -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    fill_random(key.as_mut())?;
    Ok(key)
}

/// Branch-free check for the all-zero value.
pub fn is_all_zero(bytes: &[u8]) -> bool {
    bytes.iter().fold(0u8, |acc, b| acc | b) == 0
}

/// Derive the key-encryption key for one envelope.
///
/// `KEK = HKDF-SHA256(ikm = shared, salt = epk || recipient_pub,
/// info = KEK_INFO_LABEL [|| '|' || aad], L = 32)`. The aad suffix is only
/// appended when aad is non-empty.
pub fn derive_kek(
    shared: &[u8; KEY_SIZE],
    ephemeral_pub: &[u8; KEY_SIZE],
    recipient_pub: &[u8; KEY_SIZE],
    aad: &[u8],
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut salt = [0u8; KEY_SIZE * 2];
    salt[..KEY_SIZE].copy_from_slice(ephemeral_pub);
    salt[KEY_SIZE..].copy_from_slice(recipient_pub);

    let mut info = Vec::with_capacity(KEK_INFO_LABEL.len() + 1 + aad.len());
    info.extend_from_slice(KEK_INFO_LABEL);
    if !aad.is_empty() {
        info.push(b'|');
        info.extend_from_slice(aad);
    }

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut kek = Zeroizing::new([0u8; KEY_SIZE]);
    // 32 bytes is far below the HKDF-SHA256 output limit
    hkdf.expand(&info, kek.as_mut())
        .map_err(|_| SealError::invalid_key("kek derivation failed"))?;
    Ok(kek)
}

/// ChaCha20-Poly1305 seal. Returns ciphertext with the tag appended.
pub(crate) fn aead_seal(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    msg: &[u8],
    aad: &[u8],
) -> std::result::Result<Vec<u8>, chacha20poly1305::Error> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher.encrypt(Nonce::from_slice(nonce), Payload { msg, aad })
}

/// ChaCha20-Poly1305 open. Any tag mismatch is an opaque error.
pub(crate) fn aead_open(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> std::result::Result<Vec<u8>, chacha20poly1305::Error> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher.decrypt(
        Nonce::from_slice(nonce),
        Payload {
            msg: ciphertext,
            aad,
        },
    )
}
