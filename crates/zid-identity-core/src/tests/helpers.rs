//! Test helpers and validator doubles.

use crate::*;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use zid_storage::RocksDbStorage;

pub type TestPool = StoragePool<RocksDbStorage>;
pub type TestManager<V = SchemaValidator> = IdentityManager<TestPool, V>;

/// Identity schema with an email carrying both extensions.
pub fn test_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "email": {
                "type": "string",
                "zid": {
                    "credentials": { "password": { "identifier": true } },
                    "verification": { "via": "email" }
                }
            },
            "name": { "type": "string" }
        },
        "required": ["email"]
    })
}

pub fn test_validator() -> SchemaValidator {
    SchemaValidator::new(Duration::hours(1))
        .with_schema(DEFAULT_SCHEMA_ID, &test_schema())
        .unwrap()
}

/// Helper to create test storage
pub fn create_test_storage() -> (Arc<RocksDbStorage>, TempDir) {
    let (storage, temp_dir) = RocksDbStorage::open_temporary().unwrap();
    (Arc::new(storage), temp_dir)
}

pub fn create_test_manager<V: TraitValidator>(
    storage: Arc<RocksDbStorage>,
    validator: V,
) -> TestManager<V> {
    IdentityManager::new(
        Arc::new(StoragePool::new(storage)),
        Arc::new(validator),
        ManagerConfig {
            verification_link_lifespan: Duration::hours(1),
        },
    )
}

pub fn password_credentials(identifier: &str) -> Credentials {
    Credentials::new(
        CredentialsType::Password,
        vec![identifier.to_string()],
        json!({ "hashed_password": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA" }),
    )
}

/// Create an identity with a password credential through the manager.
pub async fn seed_identity<V: TraitValidator>(manager: &TestManager<V>) -> Identity {
    let mut identity = Identity::new(DEFAULT_SCHEMA_ID)
        .with_traits(json!({ "email": "alice@example.com", "name": "Alice" }));
    identity.set_credentials(password_credentials("alice@example.com"));

    manager
        .create(&Context::background(), &mut identity, ManagerOptions::default())
        .await
        .unwrap();
    identity
}

/// Runs a real validator, then rewrites the identity like a misbehaving
/// schema extension or a smuggled payload would.
pub struct TamperingValidator<F> {
    inner: SchemaValidator,
    tamper: F,
}

impl<F> TamperingValidator<F>
where
    F: Fn(&mut Identity) + Send + Sync,
{
    pub fn new(tamper: F) -> Self {
        Self {
            inner: test_validator(),
            tamper,
        }
    }
}

#[async_trait]
impl<F> TraitValidator for TamperingValidator<F>
where
    F: Fn(&mut Identity) + Send + Sync,
{
    async fn validate(&self, identity: &mut Identity) -> std::result::Result<(), ValidateError> {
        self.inner.validate(identity).await?;
        (self.tamper)(identity);
        Ok(())
    }
}

/// Validator that never returns.
pub struct PendingValidator;

#[async_trait]
impl TraitValidator for PendingValidator {
    async fn validate(&self, _identity: &mut Identity) -> std::result::Result<(), ValidateError> {
        std::future::pending().await
    }
}
