//! Key management: X25519 key pairs with explicit scalar clamping.
//!
//! Key boundaries are raw `[u8; 32]` arrays. Clamping is a pure transform over an
//! owned array so the provenance of every scalar stays visible at the call site.

pub mod fingerprint;

use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::crypto::{fill_random, is_all_zero, KEY_SIZE};
use crate::error::{Result, SealError};

pub use fingerprint::key_id;

/// Clamp 32 bytes into a valid X25519 scalar.
///
/// Clears the low three bits of byte 0, clears the high bit of byte 31 and sets
/// its second-highest bit. Applying it twice is a no-op.
pub fn clamp_scalar(mut scalar: [u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
    scalar
}

/// Recompute the public point for a private scalar (re-clamping it first).
///
/// Returns `InvalidKey` if the result is the identity element.
pub fn public_from_private(secret: &[u8; KEY_SIZE]) -> Result<[u8; KEY_SIZE]> {
    let scalar = StaticSecret::from(clamp_scalar(*secret));
    let public = PublicKey::from(&scalar).to_bytes();
    if is_all_zero(&public) {
        return Err(SealError::invalid_key("public point is the identity"));
    }
    Ok(public)
}

/// X25519 of `secret` with `peer`, through `StaticSecret` so the scalar copy is
/// wiped on drop.
pub(crate) fn shared_secret(secret: &[u8; KEY_SIZE], peer: &[u8; KEY_SIZE]) -> Zeroizing<[u8; KEY_SIZE]> {
    let scalar = StaticSecret::from(*secret);
    let shared = scalar.diffie_hellman(&PublicKey::from(*peer));
    Zeroizing::new(shared.to_bytes())
}

/// Draw a fresh clamped scalar from the OS randomness source.
fn random_scalar() -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut raw = Zeroizing::new([0u8; KEY_SIZE]);
    fill_random(raw.as_mut())?;
    Ok(Zeroizing::new(clamp_scalar(*raw)))
}

/// A recipient's long-term X25519 key pair.
///
/// The secret scalar is zeroized on drop and never shown by `Debug`.
#[derive(Clone)]
pub struct KeyPair {
    secret: Zeroizing<[u8; KEY_SIZE]>,
    public: [u8; KEY_SIZE],
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Result<Self> {
        let secret = random_scalar()?;
        let public = public_from_private(&secret)?;
        Ok(Self { secret, public })
    }

    /// Rebuild a key pair from stored secret bytes. The bytes are clamped.
    pub fn from_secret(secret: [u8; KEY_SIZE]) -> Result<Self> {
        let secret = Zeroizing::new(clamp_scalar(secret));
        let public = public_from_private(&secret)?;
        Ok(Self { secret, public })
    }

    /// The clamped private scalar. Avoid storing or logging this value.
    pub fn secret_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.secret
    }

    pub fn public_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.public
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("secret", &"[REDACTED]")
            .field("public", &crate::util::b64(&self.public))
            .finish()
    }
}

/// Generate a new random recipient key pair.
pub fn generate_keypair() -> Result<KeyPair> {
    KeyPair::generate()
}

/// A single-use key pair for one message.
///
/// The secret half is consumed by [`EphemeralKey::diffie_hellman`], so it cannot
/// be reused for a second exchange. Not `Clone`.
pub(crate) struct EphemeralKey {
    secret: Zeroizing<[u8; KEY_SIZE]>,
    public: [u8; KEY_SIZE],
}

impl EphemeralKey {
    pub(crate) fn public_bytes(&self) -> [u8; KEY_SIZE] {
        self.public
    }

    /// X25519 with the peer's public key, consuming the ephemeral secret.
    pub(crate) fn diffie_hellman(self, peer: &[u8; KEY_SIZE]) -> Zeroizing<[u8; KEY_SIZE]> {
        shared_secret(&self.secret, peer)
    }
}

/// Generate a fresh ephemeral key for exactly one seal call.
pub(crate) fn generate_ephemeral() -> Result<EphemeralKey> {
    let secret = random_scalar()?;
    let public = public_from_private(&secret)?;
    Ok(EphemeralKey { secret, public })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_scalar_sets_expected_bits() {
        let clamped = clamp_scalar([0xffu8; 32]);
        assert_eq!(clamped[0], 0xf8, "low three bits of byte 0 must be cleared");
        assert_eq!(clamped[31], 0x7f, "high bit cleared, second-high bit set");
        assert_eq!(clamped[1..31], [0xffu8; 30], "middle bytes untouched");

        let clamped = clamp_scalar([0u8; 32]);
        assert_eq!(clamped[31], 0x40, "second-high bit must be set");
    }

    #[test]
    fn test_clamp_scalar_idempotent() {
        let once = clamp_scalar([0xa5u8; 32]);
        assert_eq!(clamp_scalar(once), once, "clamping twice must be a no-op");
    }

    #[test]
    fn test_generate_keypair_is_clamped_and_consistent() {
        let kp = generate_keypair().expect("generate_keypair should succeed");
        assert_eq!(
            clamp_scalar(*kp.secret_bytes()),
            *kp.secret_bytes(),
            "generated secret must already be clamped"
        );
        let public = public_from_private(kp.secret_bytes()).expect("public derivation");
        assert_eq!(&public, kp.public_bytes(), "public must derive from secret");
        assert_ne!(*kp.public_bytes(), [0u8; 32]);
    }

    #[test]
    fn test_generate_keypair_produces_distinct_keys() {
        let a = generate_keypair().unwrap();
        let b = generate_keypair().unwrap();
        assert_ne!(a.secret_bytes(), b.secret_bytes());
        assert_ne!(a.public_bytes(), b.public_bytes());
    }

    #[test]
    fn test_public_from_private_reclamps() {
        let raw = [0xffu8; 32];
        let from_raw = public_from_private(&raw).unwrap();
        let from_clamped = public_from_private(&clamp_scalar(raw)).unwrap();
        assert_eq!(from_raw, from_clamped, "unclamped input must be clamped first");
    }

    #[test]
    fn test_from_secret_matches_generated() {
        let kp = generate_keypair().unwrap();
        let restored = KeyPair::from_secret(*kp.secret_bytes()).unwrap();
        assert_eq!(restored.public_bytes(), kp.public_bytes());
    }

    #[test]
    fn test_keypair_debug_redacts_secret() {
        let kp = KeyPair::from_secret([42u8; 32]).unwrap();
        let debug_output = format!("{:?}", kp);
        assert!(debug_output.contains("REDACTED"));
        assert!(
            !debug_output.contains(&crate::util::b64(kp.secret_bytes())),
            "secret bytes must not appear in Debug output"
        );
    }

    #[test]
    fn test_ephemeral_exchange_agrees_with_recipient() {
        let recipient = generate_keypair().unwrap();
        let eph = generate_ephemeral().unwrap();
        let eph_pub = eph.public_bytes();

        let sender_side = eph.diffie_hellman(recipient.public_bytes());
        let recipient_side = shared_secret(recipient.secret_bytes(), &eph_pub);
        assert_eq!(*sender_side, *recipient_side, "both sides must agree on the secret");
    }

    #[test]
    fn test_shared_secret_matches_raw_x25519() {
        let a = KeyPair::from_secret([42u8; 32]).unwrap();
        let b = KeyPair::from_secret([99u8; 32]).unwrap();
        let ab = shared_secret(a.secret_bytes(), b.public_bytes());
        let ba = shared_secret(b.secret_bytes(), a.public_bytes());
        assert_eq!(*ab, *ba, "exchange must be symmetric");
        assert_eq!(
            *ab,
            x25519_dalek::x25519(*a.secret_bytes(), *b.public_bytes()),
            "must match the raw X25519 function"
        );
    }

    #[test]
    fn test_shared_secret_with_identity_point_is_zero() {
        let kp = KeyPair::from_secret([42u8; 32]).unwrap();
        assert!(is_all_zero(&shared_secret(kp.secret_bytes(), &[0u8; 32])[..]));
    }
}
