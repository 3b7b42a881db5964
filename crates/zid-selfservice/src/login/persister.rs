use super::{
    method::{RequestMethod, RequestMethods},
    request::LoginRequest,
};
use crate::errors::{LoginError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use zid_identity_core::CredentialsType;
use zid_storage::{Batch, BatchExt, Storage, CF_LOGIN_REQUESTS, CF_LOGIN_REQUEST_METHODS};

/// Login request persistence
///
/// Writers receive the request mutably: it is flattened for the write and
/// always handed back with its keyed methods rebuilt, whether or not the
/// write succeeded.
#[async_trait]
pub trait LoginRequestPersister: Send + Sync {
    async fn create_login_request(&self, request: &mut LoginRequest) -> Result<()>;

    async fn get_login_request(&self, id: Uuid) -> Result<LoginRequest>;

    /// Rewrite the request row and replace all of its methods.
    async fn update_login_request(&self, request: &mut LoginRequest) -> Result<()>;

    /// Write one method of request `id` and mark it active.
    async fn update_login_request_method(&self, id: Uuid, method: RequestMethod) -> Result<()>;

    async fn mark_login_request_forced(&self, id: Uuid) -> Result<()>;
}

/// Request row; methods are stored separately
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginRequestRow {
    id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    request_url: String,
    active: Option<CredentialsType>,
    csrf_token: String,
    forced: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LoginRequestRow {
    fn new(request: &LoginRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: request.id,
            issued_at: request.issued_at,
            expires_at: request.expires_at,
            request_url: request.request_url.clone(),
            active: request.active.clone(),
            csrf_token: request.csrf_token.clone(),
            forced: request.forced,
            created_at,
            updated_at: Utc::now(),
        }
    }

    fn into_request(self, methods: Vec<RequestMethod>) -> LoginRequest {
        LoginRequest {
            id: self.id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            request_url: self.request_url,
            active: self.active,
            methods: RequestMethods::Flattened(methods),
            csrf_token: self.csrf_token,
            forced: self.forced,
        }
    }
}

/// Method row, keyed `(request_id, method)`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MethodRow {
    request_id: Uuid,
    #[serde(flatten)]
    method: RequestMethod,
}

/// [`LoginRequestPersister`] over a key/value [`Storage`]
pub struct StorageLoginRequestPersister<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> StorageLoginRequestPersister<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn get_row(&self, id: Uuid) -> Result<LoginRequestRow> {
        self.storage
            .get(CF_LOGIN_REQUESTS, &id)
            .await?
            .ok_or(LoginError::NotFound(id))
    }

    async fn load_methods(&self, id: Uuid) -> Result<Vec<MethodRow>> {
        Ok(self.storage.get_by_prefix(CF_LOGIN_REQUEST_METHODS, &id).await?)
    }

    fn put_method(
        batch: &mut Box<dyn Batch>,
        request_id: Uuid,
        method: &RequestMethod,
    ) -> Result<()> {
        let key = (request_id, method.method.as_str());
        let row = MethodRow {
            request_id,
            method: method.clone(),
        };
        batch.put(CF_LOGIN_REQUEST_METHODS, &key, &row)?;
        Ok(())
    }

    /// Write `request` in its storage form, deleting `stale` method rows first.
    async fn write(
        &self,
        request: &LoginRequest,
        created_at: DateTime<Utc>,
        stale: &[MethodRow],
    ) -> Result<()> {
        let mut batch = self.storage.batch();

        for row in stale {
            let key = (request.id, row.method.method.as_str());
            batch.delete(CF_LOGIN_REQUEST_METHODS, &key)?;
        }

        batch.put(CF_LOGIN_REQUESTS, &request.id, &LoginRequestRow::new(request, created_at))?;
        if let RequestMethods::Flattened(entries) = &request.methods {
            // Entries sharing a credential type share a key; the last one wins.
            for method in entries {
                Self::put_method(&mut batch, request.id, method)?;
            }
        }

        batch.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl<S: Storage + 'static> LoginRequestPersister for StorageLoginRequestPersister<S> {
    async fn create_login_request(&self, request: &mut LoginRequest) -> Result<()> {
        request.to_storage_form();
        let result = self.write(request, Utc::now(), &[]).await;
        request.from_storage_form();
        result?;

        debug!("Stored login request {}", request.id);
        Ok(())
    }

    async fn get_login_request(&self, id: Uuid) -> Result<LoginRequest> {
        let row = self.get_row(id).await?;
        let methods = self.load_methods(id).await?;

        let mut request = row.into_request(methods.into_iter().map(|m| m.method).collect());
        request.from_storage_form();
        Ok(request)
    }

    async fn update_login_request(&self, request: &mut LoginRequest) -> Result<()> {
        let existing = self.get_row(request.id).await?;
        let stale = self.load_methods(request.id).await?;

        request.to_storage_form();
        let result = self.write(request, existing.created_at, &stale).await;
        request.from_storage_form();
        result?;

        debug!("Updated login request {}", request.id);
        Ok(())
    }

    async fn update_login_request_method(&self, id: Uuid, method: RequestMethod) -> Result<()> {
        let mut row = self.get_row(id).await?;
        row.active = Some(method.method.clone());
        row.updated_at = Utc::now();

        let mut batch = self.storage.batch();
        batch.put(CF_LOGIN_REQUESTS, &id, &row)?;
        Self::put_method(&mut batch, id, &method)?;
        batch.commit().await?;

        debug!("Updated method {} of login request {}", method.method, id);
        Ok(())
    }

    async fn mark_login_request_forced(&self, id: Uuid) -> Result<()> {
        let mut row = self.get_row(id).await?;
        row.forced = true;
        row.updated_at = Utc::now();
        self.storage.put(CF_LOGIN_REQUESTS, &id, &row).await?;

        debug!("Marked login request {} as forced", id);
        Ok(())
    }
}
