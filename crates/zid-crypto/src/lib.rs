//! # zid-crypto
//!
//! Random material for the zid identity service.
//!
//! - Verification codes proving control of a verifiable address
//! - Anti-CSRF tokens bound to self-service flows
//! - Constant-time comparison for secrets supplied by callers
//!
//! All randomness is drawn from the operating system CSPRNG. Entropy failures
//! surface as [`CryptoError::Entropy`] and are never retried.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod errors;
pub mod random;

pub use constants::*;
pub use errors::{CryptoError, Result};
pub use random::*;
