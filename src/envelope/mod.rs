//! Envelope engine: ECIES-lite sealing of a payload for one X25519 recipient.
//!
//! ```text
//! DEK    = random(32)
//! ct     = ChaCha20-Poly1305(DEK, nonce_data, plaintext, aad)
//! shared = X25519(ephemeral_secret, recipient_pub)          (all-zero rejected)
//! KEK    = HKDF-SHA256(shared, salt = epk || recipient_pub,
//!                      info = "goseal v1 kek" ['|' aad])
//! wdek   = ChaCha20-Poly1305(KEK, nonce_dek, DEK, aad)
//! ```
//!
//! The caller must supply the same aad at open time; it is not stored.

use zeroize::Zeroizing;

use crate::crypto::{
    aead_open, aead_seal, derive_kek, is_all_zero, random_key, random_nonce, KEY_SIZE,
    NONCE_SIZE, VERSION, WRAPPED_DEK_SIZE,
};
use crate::error::{Result, SealError};
use crate::keys::{clamp_scalar, generate_ephemeral, public_from_private, shared_secret};

/// All fields needed to recover a plaintext given the recipient's secret key.
///
/// Immutable once built; the wire codec is the only other constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub(crate) version: u32,
    pub(crate) ephemeral_pub: [u8; KEY_SIZE],
    pub(crate) nonce_dek: [u8; NONCE_SIZE],
    pub(crate) wrapped_dek: [u8; WRAPPED_DEK_SIZE],
    pub(crate) nonce_data: [u8; NONCE_SIZE],
    pub(crate) ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn ephemeral_pub(&self) -> &[u8; KEY_SIZE] {
        &self.ephemeral_pub
    }

    pub fn nonce_dek(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce_dek
    }

    pub fn wrapped_dek(&self) -> &[u8; WRAPPED_DEK_SIZE] {
        &self.wrapped_dek
    }

    pub fn nonce_data(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce_data
    }

    /// Payload ciphertext with its 16-byte tag appended.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Seal `plaintext` for `recipient_pub`, binding it to `aad`.
///
/// The DEK, both nonces and the ephemeral scalar are drawn fresh inside this call.
pub fn seal(recipient_pub: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<Envelope> {
    let dek = random_key()?;
    let nonce_data = random_nonce()?;
    let ciphertext =
        aead_seal(&dek, &nonce_data, plaintext, aad).map_err(|_| SealError::DataEncryptFailed)?;

    let ephemeral = generate_ephemeral()?;
    let ephemeral_pub = ephemeral.public_bytes();
    let shared = ephemeral.diffie_hellman(recipient_pub);
    if is_all_zero(&shared[..]) {
        tracing::debug!("seal rejected: degenerate shared secret");
        return Err(SealError::invalid_key("bad shared secret"));
    }

    let kek = derive_kek(&shared, &ephemeral_pub, recipient_pub, aad)?;
    let nonce_dek = random_nonce()?;
    let wrapped = aead_seal(&kek, &nonce_dek, &dek[..], aad)
        .map_err(|_| SealError::KeyWrapFailed)?;
    let wrapped_dek: [u8; WRAPPED_DEK_SIZE] = wrapped
        .as_slice()
        .try_into()
        .map_err(|_| SealError::KeyWrapFailed)?;

    Ok(Envelope {
        version: VERSION,
        ephemeral_pub,
        nonce_dek,
        wrapped_dek,
        nonce_data,
        ciphertext,
    })
}

/// Recover the plaintext of `envelope` with the recipient's secret scalar.
///
/// The envelope is borrowed, not consumed: the same value can be opened again,
/// e.g. retried with another key or aad.
///
/// Fails with `KeyUnwrapFailed` for a wrong key, wrong aad or a tampered wrap;
/// the three are indistinguishable. A tampered payload yields `DataDecryptFailed`.
pub fn open(recipient_secret: &[u8; KEY_SIZE], envelope: &Envelope, aad: &[u8]) -> Result<Vec<u8>> {
    if envelope.version != VERSION {
        tracing::debug!(version = envelope.version, "open rejected: unsupported version");
        return Err(SealError::unsupported_version(envelope.version));
    }

    let scalar = Zeroizing::new(clamp_scalar(*recipient_secret));
    let recipient_pub = public_from_private(&scalar)?;

    let shared = shared_secret(&scalar, &envelope.ephemeral_pub);
    if is_all_zero(&shared[..]) {
        tracing::debug!("open rejected: degenerate shared secret");
        return Err(SealError::invalid_key("bad shared secret"));
    }

    let kek = derive_kek(&shared, &envelope.ephemeral_pub, &recipient_pub, aad)?;
    let dek = Zeroizing::new(
        aead_open(&kek, &envelope.nonce_dek, &envelope.wrapped_dek, aad)
            .map_err(|_| SealError::KeyUnwrapFailed)?,
    );
    let dek: Zeroizing<[u8; KEY_SIZE]> = Zeroizing::new(
        dek.as_slice()
            .try_into()
            .map_err(|_| SealError::InvalidEnvelope {
                reason: "bad DEK length",
            })?,
    );

    aead_open(&dek, &envelope.nonce_data, &envelope.ciphertext, aad)
        .map_err(|_| SealError::DataDecryptFailed)
}
