//! Self-service flow error types.

use chrono::Duration;
use thiserror::Error;
use uuid::Uuid;
use zid_identity_core::ErrorClass;

/// Login flow errors
#[derive(Debug, Error)]
pub enum LoginError {
    /// The flow's expiry has passed
    #[error("The login request expired {} seconds ago", .elapsed.num_seconds())]
    FlowExpired {
        /// Time since `expires_at`
        elapsed: Duration,
    },

    /// `issued_at` lies in the future (clock skew or tampering)
    #[error("The login request was issued in the future")]
    IssuedInFuture,

    /// Login request not found
    #[error("Login request not found: {0}")]
    NotFound(Uuid),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] zid_storage::StorageError),

    /// Randomness for the anti-CSRF token was unavailable
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] zid_crypto::CryptoError),
}

impl LoginError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LoginError::FlowExpired { .. } | LoginError::IssuedInFuture => ErrorClass::BadRequest,
            LoginError::NotFound(_) => ErrorClass::NotFound,
            LoginError::Storage(_) | LoginError::Crypto(_) => ErrorClass::Internal,
        }
    }
}

/// Result type for self-service flow operations
pub type Result<T> = std::result::Result<T, LoginError>;
