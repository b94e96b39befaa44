/// Record module: the two portable forms of an [`Envelope`].
///
/// `Record` is the structured form, every binary field base64url-encoded under a
/// short JSON key, meant for a database row or JSON document. The dotted token
/// form lives in [`token`]. Both decode back into the same `Envelope`.
pub mod token;

use serde::{Deserialize, Serialize};

use crate::crypto::{KEY_SIZE, NONCE_SIZE, TAG_SIZE, VERSION, WRAPPED_DEK_SIZE};
use crate::envelope::{self, Envelope};
use crate::error::{Result, SealError};
use crate::util::{b64, b64d};

pub use token::{decode_token, encode_token, inspect_header, open_token, seal_token, TokenOptions};

/// A sealed envelope in structured form, safe to store as JSON.
///
/// Field names are the wire keys; do not rename them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Protocol version. Signed and wide so any JSON integer reaches the version gate.
    pub v: i64,
    /// b64url(32-byte ephemeral public key).
    pub epk: String,
    /// b64url(12-byte nonce for the DEK wrap).
    pub ndek: String,
    /// b64url(48-byte wrapped DEK).
    pub wdek: String,
    /// b64url(12-byte nonce for the payload).
    pub ndata: String,
    /// b64url(payload ciphertext + tag).
    pub ct: String,
}

/// Advisory, non-secret token header.
///
/// Not cryptographically bound: editing it does not break decryption by itself but
/// may misdirect key lookup via `kid`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Missing decodes as 0, which the version gate rejects.
    #[serde(default)]
    pub v: i64,
    pub alg: String,
    #[serde(default)]
    pub kid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub aad_hint: String,
}

impl Header {
    /// Header for the current version and algorithm suite.
    pub fn new(kid: impl Into<String>, aad_hint: impl Into<String>) -> Self {
        Header {
            v: i64::from(VERSION),
            alg: crate::crypto::ALG.to_string(),
            kid: kid.into(),
            aad_hint: aad_hint.into(),
        }
    }
}

impl Record {
    /// Compact JSON for storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SealError::invalid_record_from("encode json", e))
    }

    /// Parse a stored record. Malformed JSON is `InvalidRecord`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SealError::invalid_record_from("bad record json", e))
    }
}

impl Envelope {
    /// Structured form of this envelope.
    pub fn to_record(&self) -> Record {
        Record {
            v: i64::from(self.version),
            epk: b64(&self.ephemeral_pub),
            ndek: b64(&self.nonce_dek),
            wdek: b64(&self.wrapped_dek),
            ndata: b64(&self.nonce_data),
            ct: b64(&self.ciphertext),
        }
    }
}

impl TryFrom<&Record> for Envelope {
    type Error = SealError;

    /// Decode a record, checking the version first and then every field's encoding
    /// and fixed length.
    fn try_from(record: &Record) -> Result<Self> {
        if record.v != i64::from(VERSION) {
            return Err(SealError::unsupported_version(record.v));
        }

        let ciphertext = decode_field(&record.ct, "bad ct")?;
        if ciphertext.len() < TAG_SIZE {
            return Err(SealError::invalid_record("ciphertext shorter than tag"));
        }

        Ok(Envelope {
            version: VERSION,
            ephemeral_pub: decode_fixed::<KEY_SIZE>(&record.epk, "bad epk")?,
            nonce_dek: decode_fixed::<NONCE_SIZE>(&record.ndek, "bad ndek")?,
            wrapped_dek: decode_fixed::<WRAPPED_DEK_SIZE>(&record.wdek, "bad wdek")?,
            nonce_data: decode_fixed::<NONCE_SIZE>(&record.ndata, "bad ndata")?,
            ciphertext,
        })
    }
}

fn decode_field(encoded: &str, reason: &'static str) -> Result<Vec<u8>> {
    b64d(encoded).map_err(|e| SealError::invalid_record_from(reason, e))
}

fn decode_fixed<const N: usize>(encoded: &str, reason: &'static str) -> Result<[u8; N]> {
    decode_field(encoded, reason)?
        .as_slice()
        .try_into()
        .map_err(|_| SealError::invalid_record(reason))
}

/// Seal `plaintext` for `recipient_pub` and return the structured record.
pub fn seal_record(recipient_pub: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<Record> {
    let record = envelope::seal(recipient_pub, plaintext, aad)?.to_record();
    tracing::debug!(ct_len = record.ct.len(), "sealed envelope record");
    Ok(record)
}

/// Decode `record` and open it with the recipient's secret scalar.
pub fn open_record(recipient_secret: &[u8; KEY_SIZE], record: &Record, aad: &[u8]) -> Result<Vec<u8>> {
    let envelope = Envelope::try_from(record).inspect_err(|e| {
        tracing::debug!(error = %e, "record rejected");
    })?;
    envelope::open(recipient_secret, &envelope, aad)
}
