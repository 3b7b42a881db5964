//! # zid-identity-core
//!
//! Identity subsystem of the zid identity service.
//!
//! This crate is responsible for:
//! - The identity data model (traits, credentials, verifiable addresses)
//! - The store and trait-validator contracts the manager depends on
//! - The identity manager, including the protected-field guard on trait updates
//! - A RocksDB-backed identity pool and a JSON-schema trait validator

#![warn(clippy::all)]

pub mod context;
pub mod errors;
pub mod manager;
pub mod pool;
pub mod protected;
pub mod traits;
pub mod types;
pub mod validation;


pub use context::Context;
pub use errors::{ErrorClass, FieldError, IdentityError, Result, ValidateError, ValidationError};
pub use manager::{IdentityManager, ManagerConfig, ManagerOptions};
pub use pool::StoragePool;
pub use protected::{addresses_equal, credentials_equal};
pub use traits::{IdentityPool, PrivilegedPool, TraitValidator};
pub use types::*;
pub use validation::SchemaValidator;
