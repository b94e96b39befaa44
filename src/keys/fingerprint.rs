use sha2::{Digest, Sha256};

use crate::crypto::KEY_SIZE;

/// Short stable identifier for a public key, suitable for a token `kid`.
///
/// base64url of the first 8 bytes of SHA-256(public key): 11 characters.
pub fn key_id(public: &[u8; KEY_SIZE]) -> String {
    let digest = Sha256::digest(public);
    crate::util::b64(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_deterministic_and_short() {
        let a = key_id(&[1u8; 32]);
        assert_eq!(a, key_id(&[1u8; 32]));
        assert_eq!(a.len(), 11, "8 bytes encode to 11 base64url chars");
    }

    #[test]
    fn test_key_id_differs_per_key() {
        assert_ne!(key_id(&[1u8; 32]), key_id(&[2u8; 32]));
    }
}
