//! Sizes of generated secrets.

/// Length of a verification code in characters.
///
/// 32 characters over a 62-symbol alphabet carry roughly 190 bits of entropy.
pub const VERIFY_CODE_LENGTH: usize = 32;

/// Size of an anti-CSRF token in bytes (hex encoded on the wire).
pub const CSRF_TOKEN_SIZE: usize = 32;

/// Alphabet used for alphanumeric codes.
pub const ALPHANUMERIC: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
