//! Dotted token form: `goseal.v1.<b64url(header json)>.<b64url(payload)>`.
//!
//! The payload is the fixed-order binary concatenation:
//!
//! ```text
//! Offset  Size  Field
//! 0       32    ephemeral public key
//! 32      12    nonce for the DEK wrap
//! 44      48    wrapped DEK (32 + tag)
//! 92      12    nonce for the payload
//! 104     N     payload ciphertext + tag
//! ```
//!
//! A JSON payload is a different protocol revision and is not accepted here.

use crate::crypto::{ALG, KEY_SIZE, NONCE_SIZE, VERSION, WRAPPED_DEK_SIZE};
use crate::envelope::{self, Envelope};
use crate::error::{Result, SealError};
use crate::util::{b64, b64d};

use super::Header;

/// Literal first segment of every token.
pub const TOKEN_PREFIX: &str = "goseal";

/// Fixed bytes ahead of the ciphertext in the binary payload.
pub const PAYLOAD_MIN_LEN: usize = KEY_SIZE + NONCE_SIZE + WRAPPED_DEK_SIZE + NONCE_SIZE;

/// Advisory metadata written into the token header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Caller-chosen key identifier, e.g. [`crate::keys::key_id`] of the recipient.
    pub kid: String,
    /// Optional hint describing the aad; omitted from the header when empty.
    pub aad_hint: String,
}

impl TokenOptions {
    pub fn new(kid: impl Into<String>) -> Self {
        TokenOptions {
            kid: kid.into(),
            aad_hint: String::new(),
        }
    }

    pub fn with_aad_hint(mut self, hint: impl Into<String>) -> Self {
        self.aad_hint = hint.into();
        self
    }
}

/// Serialize an envelope and its header into a token string.
pub fn encode_token(envelope: &Envelope, header: &Header) -> Result<String> {
    let header_json = serde_json::to_vec(header)
        .map_err(|e| SealError::invalid_token_from("header encode", e))?;

    let mut payload = Vec::with_capacity(PAYLOAD_MIN_LEN + envelope.ciphertext.len());
    payload.extend_from_slice(&envelope.ephemeral_pub);
    payload.extend_from_slice(&envelope.nonce_dek);
    payload.extend_from_slice(&envelope.wrapped_dek);
    payload.extend_from_slice(&envelope.nonce_data);
    payload.extend_from_slice(&envelope.ciphertext);

    Ok(format!(
        "{}.v{}.{}.{}",
        TOKEN_PREFIX,
        envelope.version,
        b64(&header_json),
        b64(&payload)
    ))
}

/// Split a token into its header and payload segments, validating the frame.
fn split_token(token: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 4 {
        return Err(SealError::invalid_token("malformed token"));
    }
    if parts[0] != TOKEN_PREFIX {
        return Err(SealError::invalid_token("invalid prefix"));
    }
    if parts[1] != format!("v{}", VERSION) {
        return Err(SealError::unsupported_version(parts[1]));
    }
    Ok((parts[2], parts[3]))
}

fn parse_header(segment: &str) -> Result<Header> {
    let header_json =
        b64d(segment).map_err(|e| SealError::invalid_token_from("bad header encoding", e))?;
    let header: Header = serde_json::from_slice(&header_json)
        .map_err(|e| SealError::invalid_token_from("bad header json", e))?;
    if header.v != i64::from(VERSION) {
        return Err(SealError::unsupported_version(header.v));
    }
    if header.alg != ALG {
        return Err(SealError::invalid_token("unsupported alg"));
    }
    Ok(header)
}

/// Read the advisory header without decrypting, e.g. to pick the key named by `kid`.
pub fn inspect_header(token: &str) -> Result<Header> {
    let (header, _) = split_token(token)?;
    parse_header(header)
}

/// Parse a token back into its header and envelope.
pub fn decode_token(token: &str) -> Result<(Header, Envelope)> {
    let (header_segment, payload_segment) = split_token(token)?;
    let header = parse_header(header_segment)?;

    let payload =
        b64d(payload_segment).map_err(|e| SealError::invalid_token_from("bad payload encoding", e))?;
    if payload.len() < PAYLOAD_MIN_LEN {
        return Err(SealError::invalid_token("payload too short"));
    }

    let (ephemeral_pub, rest) = payload.split_at(KEY_SIZE);
    let (nonce_dek, rest) = rest.split_at(NONCE_SIZE);
    let (wrapped_dek, rest) = rest.split_at(WRAPPED_DEK_SIZE);
    let (nonce_data, ciphertext) = rest.split_at(NONCE_SIZE);

    let envelope = Envelope {
        version: VERSION,
        ephemeral_pub: fixed(ephemeral_pub)?,
        nonce_dek: fixed(nonce_dek)?,
        wrapped_dek: fixed(wrapped_dek)?,
        nonce_data: fixed(nonce_data)?,
        ciphertext: ciphertext.to_vec(),
    };
    Ok((header, envelope))
}

// Lengths are guaranteed by the split_at offsets above.
fn fixed<const N: usize>(slice: &[u8]) -> Result<[u8; N]> {
    slice
        .try_into()
        .map_err(|_| SealError::invalid_token("payload too short"))
}

/// Seal `plaintext` for `recipient_pub` and return a token string.
pub fn seal_token(
    recipient_pub: &[u8; KEY_SIZE],
    plaintext: &[u8],
    aad: &[u8],
    options: &TokenOptions,
) -> Result<String> {
    let envelope = envelope::seal(recipient_pub, plaintext, aad)?;
    let header = Header::new(options.kid.as_str(), options.aad_hint.as_str());
    let token = encode_token(&envelope, &header)?;
    tracing::debug!(kid = %header.kid, token_len = token.len(), "sealed envelope token");
    Ok(token)
}

/// Parse `token` and open it with the recipient's secret scalar.
pub fn open_token(recipient_secret: &[u8; KEY_SIZE], token: &str, aad: &[u8]) -> Result<Vec<u8>> {
    let (header, envelope) = decode_token(token).inspect_err(|e| {
        tracing::debug!(error = %e, "token rejected");
    })?;
    let plaintext = envelope::open(recipient_secret, &envelope, aad)?;
    tracing::debug!(kid = %header.kid, "opened envelope token");
    Ok(plaintext)
}
