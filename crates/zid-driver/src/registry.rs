use crate::config::Config;
use anyhow::{Context as _, Result};
use http::request::Parts;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use zid_identity_core::{
    validation::default_schema, IdentityManager, ManagerConfig, SchemaValidator, StoragePool,
    DEFAULT_SCHEMA_ID,
};
use zid_selfservice::{
    LoginError, LoginRequest, LoginRequestPersister, StorageLoginRequestPersister,
};
use zid_storage::RocksDbStorage;

pub type Pool = StoragePool<RocksDbStorage>;
pub type Manager = IdentityManager<Pool, SchemaValidator>;
pub type LoginPersister = StorageLoginRequestPersister<RocksDbStorage>;

/// Wired services shared by every caller
#[derive(Clone)]
pub struct Registry {
    pub config: Config,
    pub storage: Arc<RocksDbStorage>,
    pub identity_pool: Arc<Pool>,
    pub identity_manager: Arc<Manager>,
    pub login_persister: Arc<LoginPersister>,
}

impl Registry {
    /// Open the configured database and wire all services on top of it.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(
            RocksDbStorage::open(&config.database_path).with_context(|| {
                format!("failed to open database at {}", config.database_path.display())
            })?,
        );
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Arc<RocksDbStorage>) -> Result<Self> {
        let validator = Arc::new(load_validator(&config)?);

        let identity_pool = Arc::new(StoragePool::new(storage.clone()));
        let identity_manager = Arc::new(IdentityManager::new(
            identity_pool.clone(),
            validator,
            ManagerConfig {
                verification_link_lifespan: config.verification_link_lifespan(),
            },
        ));
        let login_persister = Arc::new(StorageLoginRequestPersister::new(storage.clone()));

        info!("Registry ready (database: {})", config.database_path.display());

        Ok(Registry {
            config,
            storage,
            identity_pool,
            identity_manager,
            login_persister,
        })
    }

    /// Start and persist a login flow for the incoming request.
    pub async fn new_login_request(
        &self,
        parts: &Parts,
    ) -> zid_selfservice::Result<LoginRequest> {
        let csrf_token = zid_crypto::new_csrf_token()?;
        let mut request =
            LoginRequest::new(self.config.login_request_lifespan(), csrf_token, parts);
        self.login_persister.create_login_request(&mut request).await?;

        info!("Login request started: {}", request.id);
        Ok(request)
    }

    /// Load a login flow and reject it if it is expired or issued in the future.
    pub async fn get_valid_login_request(
        &self,
        id: Uuid,
    ) -> zid_selfservice::Result<LoginRequest> {
        let request = self.login_persister.get_login_request(id).await?;
        if let Err(err) = request.valid() {
            if let LoginError::FlowExpired { elapsed } = &err {
                warn!(
                    "Login request {} expired {} seconds ago",
                    id,
                    elapsed.num_seconds()
                );
            } else {
                warn!("Rejected login request {}: {}", id, err);
            }
            return Err(err);
        }
        Ok(request)
    }
}

fn load_validator(config: &Config) -> Result<SchemaValidator> {
    let schema = match &config.identity_schema_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read identity schema {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("identity schema {} is not valid JSON", path.display()))?
        }
        None => default_schema(),
    };

    let validator = SchemaValidator::new(config.verification_link_lifespan())
        .with_schema(DEFAULT_SCHEMA_ID, &schema)?;
    Ok(validator)
}
