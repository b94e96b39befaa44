//! goseal: envelope encryption for device-bound payloads.
//!
//! 1. A random 32-byte DEK seals the payload with ChaCha20-Poly1305.
//! 2. An ephemeral X25519 exchange with the recipient's public key feeds HKDF-SHA256,
//!    producing a KEK that seals the DEK.
//! 3. The result travels as a dotted token (`goseal.v1.<header>.<payload>`) or is
//!    stored as a structured [`Record`].
//!
//! [`wrap_secret`] separately protects long-term key material under a password.
//!
//! ```
//! use goseal::{generate_keypair, open_token, seal_token, TokenOptions};
//!
//! let kp = generate_keypair().unwrap();
//! let aad = b"user:42|record:100";
//! let token = seal_token(kp.public_bytes(), b"secret payload", aad, &TokenOptions::new("key-1")).unwrap();
//! let plain = open_token(kp.secret_bytes(), &token, aad).unwrap();
//! assert_eq!(plain, b"secret payload");
//! ```
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod record;
pub mod util;
pub mod wrap;

pub use envelope::{open, seal, Envelope};
pub use error::{Result, SealError, WireCause};
pub use keys::{clamp_scalar, generate_keypair, key_id, public_from_private, KeyPair};
pub use record::{
    decode_token, encode_token, inspect_header, open_record, open_token, seal_record, seal_token,
    Header, Record, TokenOptions,
};
pub use wrap::{unwrap_secret, wrap_secret, WrappedSecret};
