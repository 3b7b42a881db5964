use super::method::{RequestMethod, RequestMethods};
use crate::{
    errors::{LoginError, Result},
    flow::request_url,
};
use chrono::{DateTime, Duration, Utc};
use http::request::Parts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use zid_identity_core::CredentialsType;

/// State of one login attempt
///
/// Created when a client starts a login, then consulted and updated on every
/// step until it expires. The anti-CSRF token is never serialized into API
/// payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Absolute URL the flow was initiated from
    pub request_url: String,
    /// Method the client last submitted, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<CredentialsType>,
    #[serde(default)]
    pub methods: RequestMethods,
    #[serde(skip)]
    pub csrf_token: String,
    /// Re-authentication requested even though a session exists
    #[serde(default)]
    pub forced: bool,
}

impl LoginRequest {
    /// Start a login flow for the request described by `parts`, valid for `lifespan`.
    pub fn new(lifespan: Duration, csrf_token: impl Into<String>, parts: &Parts) -> Self {
        let issued_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            issued_at,
            expires_at: issued_at + lifespan,
            request_url: request_url(parts),
            active: None,
            methods: RequestMethods::default(),
            csrf_token: csrf_token.into(),
            forced: false,
        }
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// Fail if the request has expired or claims to be issued in the future.
    ///
    /// Expiry is checked first.
    pub fn valid(&self) -> Result<()> {
        let now = Utc::now();
        if self.expires_at < now {
            return Err(LoginError::FlowExpired {
                elapsed: now - self.expires_at,
            });
        }
        if self.issued_at > now {
            return Err(LoginError::IssuedInFuture);
        }
        Ok(())
    }

    /// Keyed methods; `None` while the request is in its storage form.
    pub fn methods(&self) -> Option<&BTreeMap<CredentialsType, RequestMethod>> {
        self.methods.as_map()
    }

    pub fn methods_mut(&mut self) -> Option<&mut BTreeMap<CredentialsType, RequestMethod>> {
        self.methods.as_map_mut()
    }

    pub fn method(&self, method: &CredentialsType) -> Option<&RequestMethod> {
        self.methods().and_then(|m| m.get(method))
    }

    /// Add or replace the method of the same credential type.
    pub fn set_method(&mut self, method: RequestMethod) {
        match &mut self.methods {
            RequestMethods::Mapped(map) => {
                map.insert(method.method.clone(), method);
            }
            RequestMethods::Flattened(entries) => entries.push(method),
        }
    }

    pub fn set_active(&mut self, method: CredentialsType) {
        self.active = Some(method);
    }

    /// Compare `token` against the flow's anti-CSRF token in constant time.
    pub fn verify_csrf(&self, token: &str) -> bool {
        !self.csrf_token.is_empty()
            && zid_crypto::constant_time_eq(self.csrf_token.as_bytes(), token.as_bytes())
    }

    /// Flatten the methods into one entry per method for writing.
    pub fn to_storage_form(&mut self) {
        self.methods.flatten();
    }

    /// Rebuild the keyed methods after a read or write.
    pub fn from_storage_form(&mut self) {
        self.methods.rebuild();
    }
}
