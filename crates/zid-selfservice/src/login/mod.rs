//! Login flow: request state, its methods and persistence.

mod method;
mod persister;
mod request;

pub use method::{RequestMethod, RequestMethods};
pub use persister::{LoginRequestPersister, StorageLoginRequestPersister};
pub use request::LoginRequest;
