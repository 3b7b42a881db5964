//! Identity pool backed by `zid-storage`.

use crate::{
    errors::{IdentityError, Result},
    traits::{IdentityPool, PrivilegedPool},
    types::*,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use zid_storage::{
    Batch, BatchExt, Storage, CF_CREDENTIAL_IDENTIFIERS, CF_IDENTITIES, CF_IDENTITY_CREDENTIALS,
    CF_VERIFIABLE_ADDRESSES,
};

/// Stored identity row. Credentials and addresses live in their own column
/// families; `address_ids` preserves the address order, and `None` records an
/// absent address list as opposed to an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityRow {
    id: Uuid,
    schema_id: String,
    traits: Traits,
    #[serde(default)]
    address_ids: Option<Vec<Uuid>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityRow {
    fn from_identity(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            schema_id: identity.schema_id.clone(),
            traits: identity.traits.clone(),
            address_ids: identity
                .verifiable_addresses
                .as_ref()
                .map(|addresses| addresses.iter().map(|a| a.id).collect()),
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// [`PrivilegedPool`] over a key/value [`Storage`]
///
/// Every create and update is committed as one atomic batch. Reads and writes
/// are not serialized against each other: two concurrent updates of the same
/// identity are last-writer-wins, which makes the protected-field guard
/// best-effort under concurrent privileged writers.
pub struct StoragePool<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> StoragePool<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn get_row(&self, id: Uuid) -> Result<IdentityRow> {
        self.storage
            .get(CF_IDENTITIES, &id)
            .await?
            .ok_or(IdentityError::NotFound(id))
    }

    async fn load_credentials(&self, id: Uuid) -> Result<HashMap<CredentialsType, Credentials>> {
        let stored: Vec<Credentials> = self
            .storage
            .get_by_prefix(CF_IDENTITY_CREDENTIALS, &id)
            .await?;
        Ok(stored
            .into_iter()
            .map(|c| (c.credential_type.clone(), c))
            .collect())
    }

    async fn load_addresses(&self, row: &IdentityRow) -> Result<Option<Vec<VerifiableAddress>>> {
        let Some(address_ids) = &row.address_ids else {
            return Ok(None);
        };

        let mut addresses = Vec::with_capacity(address_ids.len());
        for address_id in address_ids {
            let address: VerifiableAddress = self
                .storage
                .get(CF_VERIFIABLE_ADDRESSES, address_id)
                .await?
                .ok_or(IdentityError::AddressNotFound(*address_id))?;
            addresses.push(address);
        }
        Ok(Some(addresses))
    }

    async fn assemble(&self, row: IdentityRow) -> Result<Identity> {
        let credentials = self.load_credentials(row.id).await?;
        let verifiable_addresses = self.load_addresses(&row).await?;

        Ok(Identity {
            id: row.id,
            schema_id: row.schema_id,
            traits: row.traits,
            credentials,
            verifiable_addresses,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Fail if any credential identifier of `identity` belongs to another identity.
    async fn ensure_identifiers_available(&self, identity: &Identity) -> Result<()> {
        for credentials in identity.credentials.values() {
            for identifier in &credentials.identifiers {
                let key = (credentials.credential_type.as_str(), identifier.as_str());
                let owner: Option<Uuid> = self.storage.get(CF_CREDENTIAL_IDENTIFIERS, &key).await?;
                if matches!(owner, Some(owner) if owner != identity.id) {
                    return Err(IdentityError::DuplicateCredentials {
                        credential_type: credentials.credential_type.clone(),
                        identifier: identifier.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Key credentials by their own type and bind addresses to the identity.
    fn normalize(identity: &mut Identity) {
        let credentials = std::mem::take(&mut identity.credentials);
        identity.credentials = credentials
            .into_values()
            .map(|c| (c.credential_type.clone(), c))
            .collect();

        for address in identity.verifiable_addresses.iter_mut().flatten() {
            address.identity_id = identity.id;
            if address.id.is_nil() {
                address.id = Uuid::new_v4();
            }
        }
    }

    fn write_identity(batch: &mut Box<dyn Batch>, identity: &Identity) -> Result<()> {
        batch.put(CF_IDENTITIES, &identity.id, &IdentityRow::from_identity(identity))?;

        for credentials in identity.credentials.values() {
            let key = (identity.id, credentials.credential_type.as_str());
            batch.put(CF_IDENTITY_CREDENTIALS, &key, credentials)?;
            for identifier in &credentials.identifiers {
                let index_key = (credentials.credential_type.as_str(), identifier.as_str());
                batch.put(CF_CREDENTIAL_IDENTIFIERS, &index_key, &identity.id)?;
            }
        }

        for address in identity.addresses() {
            batch.put(CF_VERIFIABLE_ADDRESSES, &address.id, address)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Storage + 'static> IdentityPool for StoragePool<S> {
    async fn get_identity(&self, id: Uuid) -> Result<Identity> {
        let row = self.get_row(id).await?;
        let verifiable_addresses = self.load_addresses(&row).await?;

        Ok(Identity {
            id: row.id,
            schema_id: row.schema_id,
            traits: row.traits,
            credentials: HashMap::new(),
            verifiable_addresses,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl<S: Storage + 'static> PrivilegedPool for StoragePool<S> {
    async fn create_identity(&self, identity: &mut Identity) -> Result<()> {
        if self.storage.exists(CF_IDENTITIES, &identity.id).await? {
            return Err(IdentityError::DuplicateIdentity(identity.id));
        }

        Self::normalize(identity);
        self.ensure_identifiers_available(identity).await?;

        let now = Utc::now();
        identity.created_at = now;
        identity.updated_at = now;

        let mut batch = self.storage.batch();
        Self::write_identity(&mut batch, identity)?;
        batch.commit().await?;

        debug!("Stored identity {}", identity.id);
        Ok(())
    }

    async fn update_identity(&self, identity: &mut Identity) -> Result<()> {
        let existing_row = self.get_row(identity.id).await?;
        let existing_credentials = self.load_credentials(identity.id).await?;

        Self::normalize(identity);
        self.ensure_identifiers_available(identity).await?;

        identity.created_at = existing_row.created_at;
        identity.updated_at = Utc::now();

        let mut batch = self.storage.batch();

        for credentials in existing_credentials.values() {
            let key = (identity.id, credentials.credential_type.as_str());
            batch.delete(CF_IDENTITY_CREDENTIALS, &key)?;
            for identifier in &credentials.identifiers {
                let index_key = (credentials.credential_type.as_str(), identifier.as_str());
                batch.delete(CF_CREDENTIAL_IDENTIFIERS, &index_key)?;
            }
        }

        let kept: HashSet<Uuid> = identity.addresses().iter().map(|a| a.id).collect();
        for address_id in existing_row
            .address_ids
            .iter()
            .flatten()
            .filter(|id| !kept.contains(id))
        {
            batch.delete(CF_VERIFIABLE_ADDRESSES, address_id)?;
        }

        // Puts after deletes: a batch applies in order, so rewritten keys survive.
        Self::write_identity(&mut batch, identity)?;
        batch.commit().await?;

        debug!("Updated identity {}", identity.id);
        Ok(())
    }

    async fn get_identity_confidential(&self, id: Uuid) -> Result<Identity> {
        let row = self.get_row(id).await?;
        self.assemble(row).await
    }

    async fn get_verifiable_address(&self, id: Uuid) -> Result<VerifiableAddress> {
        self.storage
            .get(CF_VERIFIABLE_ADDRESSES, &id)
            .await?
            .ok_or(IdentityError::AddressNotFound(id))
    }

    async fn update_verifiable_address(&self, address: &mut VerifiableAddress) -> Result<()> {
        if !self.storage.exists(CF_VERIFIABLE_ADDRESSES, &address.id).await? {
            return Err(IdentityError::AddressNotFound(address.id));
        }

        self.storage
            .put(CF_VERIFIABLE_ADDRESSES, &address.id, address)
            .await?;

        debug!("Updated verifiable address {}", address.id);
        Ok(())
    }
}
