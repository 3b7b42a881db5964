//! # zid-driver
//!
//! Wires the zid crates together: configuration from the environment,
//! the `tracing` subscriber, and a [`Registry`] holding the storage, the
//! identity manager and the login request persister.

#![warn(clippy::all)]

pub mod config;
pub mod registry;
pub mod telemetry;

pub use config::Config;
pub use registry::{LoginPersister, Manager, Pool, Registry};
pub use telemetry::init_tracing;
