use thiserror::Error;

/// Result alias used by every fallible goseal operation.
pub type Result<T> = std::result::Result<T, SealError>;

/// Every failure goseal can report.
///
/// The set is closed so callers can match exhaustively. Messages never carry key
/// material, plaintext, associated data or derived keys.
#[derive(Error, Debug)]
pub enum SealError {
    /// Malformed scalar or point, degenerate shared secret, or empty wrap input.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: &'static str },

    /// Structured record or wrapped secret could not be decoded.
    #[error("invalid record: {reason}")]
    InvalidRecord {
        reason: &'static str,
        #[source]
        source: Option<WireCause>,
    },

    /// Dotted token could not be parsed.
    #[error("invalid token: {reason}")]
    InvalidToken {
        reason: &'static str,
        #[source]
        source: Option<WireCause>,
    },

    /// Envelope decoded but its contents are inconsistent (e.g. bad DEK length).
    #[error("invalid envelope: {reason}")]
    InvalidEnvelope { reason: &'static str },

    /// Version field present but not the one this build supports.
    #[error("unsupported version: {found}")]
    UnsupportedVersion { found: String },

    /// The OS randomness source failed; the operation was aborted.
    #[error("random source failure")]
    RandomSource(#[source] rand::Error),

    /// AEAD refused to seal the data key or secret.
    #[error("cannot wrap key")]
    KeyWrapFailed,

    /// Tag mismatch on the key-wrap layer: wrong key, wrong aad or tampering.
    #[error("cannot unwrap key (wrong key, wrong associated data or corrupted input)")]
    KeyUnwrapFailed,

    /// AEAD refused to seal the payload.
    #[error("cannot encrypt data")]
    DataEncryptFailed,

    /// Tag mismatch on the payload layer.
    #[error("cannot decrypt data (wrong associated data or corrupted ciphertext)")]
    DataDecryptFailed,
}

/// Underlying decoder failure carried by wire-format errors.
#[derive(Error, Debug)]
pub enum WireCause {
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SealError {
    pub(crate) fn invalid_key(reason: &'static str) -> Self {
        SealError::InvalidKey { reason }
    }

    pub(crate) fn invalid_record(reason: &'static str) -> Self {
        SealError::InvalidRecord {
            reason,
            source: None,
        }
    }

    pub(crate) fn invalid_record_from(reason: &'static str, cause: impl Into<WireCause>) -> Self {
        SealError::InvalidRecord {
            reason,
            source: Some(cause.into()),
        }
    }

    pub(crate) fn invalid_token(reason: &'static str) -> Self {
        SealError::InvalidToken {
            reason,
            source: None,
        }
    }

    pub(crate) fn invalid_token_from(reason: &'static str, cause: impl Into<WireCause>) -> Self {
        SealError::InvalidToken {
            reason,
            source: Some(cause.into()),
        }
    }

    pub(crate) fn unsupported_version(found: impl ToString) -> Self {
        SealError::UnsupportedVersion {
            found: found.to_string(),
        }
    }
}
