//! # zid-selfservice
//!
//! Self-service flow state for the zid identity service.
//!
//! Flows are time-bounded records created when a browser or API client starts
//! an interaction (currently: login) and consulted on every subsequent step.
//! Expiry is evaluated lazily through each flow's `valid()`; nothing here
//! sweeps expired records.

#![warn(clippy::all)]

pub mod errors;
pub mod flow;
pub mod form;
pub mod login;

pub use errors::{LoginError, Result};
pub use flow::{request_url, TlsConnection};
pub use form::{FormError, FormField, RequestMethodConfig, CSRF_TOKEN_FIELD};
pub use login::{
    LoginRequest, LoginRequestPersister, RequestMethod, RequestMethods,
    StorageLoginRequestPersister,
};
