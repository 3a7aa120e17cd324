//! Idempotency primitives for safe order resubmission.
//!
//! Websites attach a caller-generated key to each order. Resubmitting the
//! same key with the same payload replays the stored order instead of
//! creating a duplicate; the same key with a different payload is a
//! conflict. Payload equality is judged by a SHA-256 hash over the
//! canonicalised request JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Longest accepted idempotency key.
const MAX_KEY_LENGTH: usize = 128;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    /// The key was empty.
    #[error("idempotency key must not be empty")]
    Empty,
    /// The key had surrounding whitespace.
    #[error("idempotency key must not have surrounding whitespace")]
    Untrimmed,
    /// The key exceeded [`MAX_KEY_LENGTH`] bytes.
    #[error("idempotency key must be at most {MAX_KEY_LENGTH} bytes")]
    TooLong,
}

/// Caller-supplied replay token for order submission.
///
/// Opaque to the relay: websites commonly send UUIDs, but any non-empty
/// trimmed token up to 128 bytes is honoured.
///
/// # Examples
/// ```
/// use relay_backend::domain::IdempotencyKey;
///
/// let key = IdempotencyKey::new("order-165-0042").expect("valid key");
/// assert_eq!(key.as_str(), "order-165-0042");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and construct a key.
    ///
    /// # Errors
    ///
    /// Rejects empty, untrimmed, and over-long values.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdempotencyKeyValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdempotencyKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(IdempotencyKeyValidationError::Untrimmed);
        }
        if raw.len() > MAX_KEY_LENGTH {
            return Err(IdempotencyKeyValidationError::TooLong);
        }
        Ok(Self(raw))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors raised when fingerprinting a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadHashError {
    /// The stored hex string was not a 32-byte SHA-256 digest.
    #[error("payload hash must be 64 hex characters")]
    InvalidEncoding,
    /// Canonical JSON serialisation failed.
    #[error("failed to serialise canonical payload: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },
}

/// SHA-256 fingerprint of a canonicalised order payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Decode a fingerprint from its lowercase hex storage form.
    ///
    /// # Errors
    ///
    /// Rejects strings that are not exactly 64 hex characters.
    pub fn from_hex(raw: &str) -> Result<Self, PayloadHashError> {
        let bytes = hex::decode(raw).map_err(|_| PayloadHashError::InvalidEncoding)?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PayloadHashError::InvalidEncoding)?;
        Ok(Self(digest))
    }

    /// Encode the fingerprint as lowercase hex for storage.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonicalise a JSON value and compute its SHA-256 fingerprint.
///
/// Object keys are sorted recursively and the result is hashed in compact
/// form, so semantically identical payloads fingerprint identically
/// regardless of key order or whitespace.
///
/// # Errors
///
/// Fails only if the canonical form cannot be serialised.
///
/// # Examples
/// ```
/// use relay_backend::domain::canonicalize_and_hash;
/// use serde_json::json;
///
/// let a = canonicalize_and_hash(&json!({"b": 2, "a": 1})).expect("hash a");
/// let b = canonicalize_and_hash(&json!({"a": 1, "b": 2})).expect("hash b");
/// assert_eq!(a, b);
/// ```
pub fn canonicalize_and_hash(
    value: &serde_json::Value,
) -> Result<PayloadHash, PayloadHashError> {
    let canonical = canonicalize(value);
    let bytes =
        serde_json::to_vec(&canonical).map_err(|err| PayloadHashError::Serialization {
            message: err.to_string(),
        })?;
    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    Ok(PayloadHash(digest))
}

/// Recursively sort object keys; arrays keep their element order.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(key, _)| key.as_str());
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}
