// Error types for ctverify
//
// A single structured error enum covers the whole crate. Callers distinguish
// failure modes by matching on the variant tag, never on type identity.
// Signature, proof and trust-lookup failures are NOT errors; they are values
// of `policy::SctVerificationResult`.

use thiserror::Error;

/// Main error type for ctverify operations
#[derive(Debug, Error)]
pub enum CtError {
    /// A binary structure violates the declared grammar: a length prefix
    /// exceeds the remaining bytes, the buffer is truncated, or trailing
    /// bytes remain after a structure that must consume its input exactly.
    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    /// A base64 or text envelope cannot be decoded.
    #[error("Invalid encoding: {message}")]
    InvalidEncoding { message: String },

    /// Any other internal failure, with a human-readable message and an
    /// optional wrapped cause.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CtError {
    /// Malformed binary input
    pub fn malformed(message: impl Into<String>) -> Self {
        CtError::MalformedInput {
            message: message.into(),
        }
    }

    /// Invalid base64/text envelope
    pub fn encoding(message: impl Into<String>) -> Self {
        CtError::InvalidEncoding {
            message: message.into(),
        }
    }

    /// Internal failure without a cause
    pub fn internal(message: impl Into<String>) -> Self {
        CtError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Internal failure wrapping a cause
    pub fn internal_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CtError::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<base64::DecodeError> for CtError {
    fn from(err: base64::DecodeError) -> Self {
        CtError::InvalidEncoding {
            message: format!("Base64 decode failed: {}", err),
        }
    }
}

impl From<openssl::error::ErrorStack> for CtError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        CtError::internal_with("OpenSSL operation failed", err)
    }
}

impl From<serde_json::Error> for CtError {
    fn from(err: serde_json::Error) -> Self {
        CtError::internal_with("JSON deserialization failed", err)
    }
}

impl From<reqwest::Error> for CtError {
    fn from(err: reqwest::Error) -> Self {
        CtError::internal_with("HTTP request failed", err)
    }
}
