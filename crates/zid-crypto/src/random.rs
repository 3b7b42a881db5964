//! Verification codes and flow tokens.

use crate::{
    constants::{ALPHANUMERIC, CSRF_TOKEN_SIZE, VERIFY_CODE_LENGTH},
    errors::{CryptoError, Result},
};
use rand::{rngs::OsRng, RngCore};

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above this bound are rejected to keep the distribution uniform.
const REJECTION_BOUND: u8 = (256 - 256 % ALPHANUMERIC.len()) as u8;

/// Fill `buf` from the OS random source.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::Entropy(e.to_string()))
}

/// Generate `len` characters drawn uniformly from `[A-Za-z0-9]`.
pub fn random_alphanumeric(len: usize) -> Result<String> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while out.len() < len {
        fill_random(&mut buf)?;
        for &b in buf.iter().filter(|b| **b < REJECTION_BOUND) {
            if out.len() == len {
                break;
            }
            out.push(ALPHANUMERIC[(b as usize) % ALPHANUMERIC.len()] as char);
        }
    }

    Ok(out)
}

/// Generate a fresh single-use verification code.
pub fn new_verify_code() -> Result<String> {
    random_alphanumeric(VERIFY_CODE_LENGTH)
}

/// Generate a hex-encoded anti-CSRF token.
pub fn new_csrf_token() -> Result<String> {
    let mut token = [0u8; CSRF_TOKEN_SIZE];
    fill_random(&mut token)?;
    Ok(hex::encode(token))
}

/// Compare two secrets in constant time.
///
/// Length differences return early; only the content comparison is constant time.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
