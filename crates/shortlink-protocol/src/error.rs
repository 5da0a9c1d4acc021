//! Error types for the signed redirect protocol

use thiserror::Error;

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while building or verifying a signed redirect request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A required parameter is absent or empty
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Parameter name
        name: String,
    },

    /// A parameter is present but cannot be interpreted
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The `sign` field does not match the canonical string
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The request timestamp is older than the accepted window
    #[error("Request expired: age {age}s exceeds {max_age}s")]
    Expired {
        /// Age of the request in seconds
        age: i64,
        /// Maximum accepted age in seconds
        max_age: u64,
    },

    /// The request timestamp is too far in the future
    #[error("Request timestamp {skew}s ahead of verifier clock (max {max_skew}s)")]
    FromFuture {
        /// Seconds ahead of the verifier clock
        skew: i64,
        /// Maximum tolerated skew in seconds
        max_skew: u64,
    },

    /// Keyed signing was selected without a usable secret
    #[error("Signing secret is missing or empty")]
    MissingSecret,
}

impl ProtocolError {
    /// Shorthand for [`ProtocolError::MissingParameter`]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Shorthand for [`ProtocolError::InvalidParameter`]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
