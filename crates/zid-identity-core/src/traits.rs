//! Store and validator contracts consumed by the identity manager.

use crate::{
    errors::{Result, ValidateError},
    types::*,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Read access to identities for unprivileged callers
#[async_trait]
pub trait IdentityPool: Send + Sync {
    /// Get an identity by ID. Credentials are never included.
    async fn get_identity(&self, id: Uuid) -> Result<Identity>;
}

/// Full access to identities, including credential material
///
/// Implementations must make the confidential read and the subsequent update
/// of the same identity observe a consistent view (e.g. by serializing writers
/// or by optimistic locking). When they cannot, the protected-field guard of
/// [`crate::IdentityManager::update_traits`] is best-effort only.
#[async_trait]
pub trait PrivilegedPool: IdentityPool {
    /// Persist a new identity with its credentials and addresses.
    async fn create_identity(&self, identity: &mut Identity) -> Result<()>;

    /// Replace traits, credentials and addresses of an existing identity.
    async fn update_identity(&self, identity: &mut Identity) -> Result<()>;

    /// Get an identity by ID including its credentials.
    async fn get_identity_confidential(&self, id: Uuid) -> Result<Identity>;

    /// Get a verifiable address by ID.
    async fn get_verifiable_address(&self, id: Uuid) -> Result<VerifiableAddress>;

    /// Persist changes to an existing verifiable address.
    async fn update_verifiable_address(&self, address: &mut VerifiableAddress) -> Result<()>;
}

/// Validates identity traits against the identity's schema
///
/// Takes the identity mutably: schema extensions may derive credential
/// identifiers and verifiable addresses from the traits they validate.
#[async_trait]
pub trait TraitValidator: Send + Sync {
    async fn validate(&self, identity: &mut Identity) -> std::result::Result<(), ValidateError>;
}
