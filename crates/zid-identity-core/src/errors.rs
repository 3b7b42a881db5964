//! Identity error types.

use crate::types::CredentialsType;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Message returned when an unprivileged update touched credentials or addresses.
///
/// Fixed so that nothing about the identity's credentials leaks to the caller.
pub const PROTECTED_FIELD_MODIFIED_MESSAGE: &str = "A field was modified that updates one or more \
credentials-related settings. This action was blocked because an unprivileged method was used to \
execute the update. This is either a configuration issue or a bug and should be reported to the \
system administrator.";

/// Transport-independent error class, used by outer layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    Cancelled,
    Internal,
}

impl ErrorClass {
    /// HTTP status code conventionally associated with this class.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::Forbidden => 403,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::Cancelled => 499,
            ErrorClass::Internal => 500,
        }
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON pointer into the traits document, empty for the root
    pub instance_path: String,
    pub message: String,
}

/// Structured trait validation failure
///
/// `Display` only renders the summary; field-level detail is reachable through
/// [`ValidationError::causes`] for callers that opted into seeing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub schema_id: String,
    pub causes: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(schema_id: impl Into<String>, causes: Vec<FieldError>) -> Self {
        Self {
            schema_id: schema_id.into(),
            causes,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "identity traits do not match schema \"{}\"",
            self.schema_id
        )
    }
}

impl std::error::Error for ValidationError {}

/// Error returned by a [`crate::TraitValidator`]
#[derive(Debug, Error)]
pub enum ValidateError {
    /// Traits violate the schema
    #[error(transparent)]
    Schema(ValidationError),

    /// Validator failure unrelated to the traits themselves
    #[error("{0}")]
    Other(String),
}

/// Identity errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Identity not found
    #[error("Identity not found: {0}")]
    NotFound(Uuid),

    /// Verifiable address not found
    #[error("Verifiable address not found: {0}")]
    AddressNotFound(Uuid),

    /// Traits failed schema validation (full detail)
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// Traits failed schema validation (redacted for untrusted callers)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unprivileged update changed credentials or verifiable addresses
    #[error("{}", PROTECTED_FIELD_MODIFIED_MESSAGE)]
    ProtectedFieldModified,

    /// Identity already exists
    #[error("Identity already exists: {0}")]
    DuplicateIdentity(Uuid),

    /// Credential identifier already bound to another identity
    #[error("An identity with the same {credential_type} identifier already exists")]
    DuplicateCredentials {
        credential_type: CredentialsType,
        identifier: String,
    },

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Caller deadline elapsed
    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    /// Validator failed for reasons other than the traits
    #[error("Trait validator error: {0}")]
    Validator(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] zid_storage::StorageError),

    /// Cryptographic error
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] zid_crypto::CryptoError),
}

impl IdentityError {
    pub fn class(&self) -> ErrorClass {
        match self {
            IdentityError::NotFound(_) | IdentityError::AddressNotFound(_) => ErrorClass::NotFound,
            IdentityError::Validation(_) | IdentityError::BadRequest(_) => ErrorClass::BadRequest,
            IdentityError::ProtectedFieldModified => ErrorClass::Forbidden,
            IdentityError::DuplicateIdentity(_) | IdentityError::DuplicateCredentials { .. } => {
                ErrorClass::Conflict
            }
            IdentityError::Cancelled | IdentityError::DeadlineExceeded => ErrorClass::Cancelled,
            IdentityError::Validator(_) | IdentityError::Storage(_) | IdentityError::Crypto(_) => {
                ErrorClass::Internal
            }
        }
    }
}

impl From<ValidateError> for IdentityError {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::Schema(e) => IdentityError::Validation(e),
            ValidateError::Other(msg) => IdentityError::Validator(msg),
        }
    }
}

/// Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_hides_causes() {
        let err = ValidationError::new(
            "default",
            vec![FieldError {
                instance_path: "/email".to_string(),
                message: "\"not-an-email\" is not a \"email\"".to_string(),
            }],
        );

        let rendered = err.to_string();
        assert!(rendered.contains("default"));
        assert!(!rendered.contains("/email"));
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            IdentityError::ProtectedFieldModified.class(),
            ErrorClass::Forbidden
        );
        assert_eq!(
            IdentityError::BadRequest("x".into()).class().status_code(),
            400
        );
        assert_eq!(
            IdentityError::NotFound(Uuid::nil()).class().status_code(),
            404
        );
        assert_eq!(IdentityError::Cancelled.class(), ErrorClass::Cancelled);
    }

    #[test]
    fn test_protected_field_message_is_fixed() {
        assert_eq!(
            IdentityError::ProtectedFieldModified.to_string(),
            PROTECTED_FIELD_MODIFIED_MESSAGE
        );
    }
}
