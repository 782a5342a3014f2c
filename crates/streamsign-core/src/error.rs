//! Error types for the signing engine.

/// Signing and verification errors.
///
/// Variants never carry key material or raw signature bytes.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// Key length is not usable by the block cipher.
    #[error("invalid key length: {len} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength { len: usize },

    /// Ciphertext could not be decrypted (bad padding or block size).
    #[error("decryption failed: {reason}")]
    Decrypt { reason: String },

    /// Input was not valid URL-safe Base64.
    #[error("invalid base64: {reason}")]
    Base64 { reason: String },

    /// Encoded policy could not be decoded into a policy.
    #[error("malformed policy: {reason}")]
    MalformedPolicy { reason: String },

    /// A policy was constructed with invalid values.
    #[error("invalid policy: {reason}")]
    InvalidPolicy { reason: String },

    /// Configuration error (authorizer settings, key files).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// I/O error while reading configuration or keys.
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SigningError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPolicy {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Base64 { .. } | Self::MalformedPolicy { .. } | Self::Decrypt { .. }
        )
    }
}

impl From<base64::DecodeError> for SigningError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64 {
            reason: err.to_string(),
        }
    }
}

/// Result type for signing operations.
pub type SigningResult<T> = Result<T, SigningError>;
