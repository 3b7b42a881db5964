//! Identity type definitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Schema id assigned to identities that do not name one.
pub const DEFAULT_SCHEMA_ID: &str = "default";

fn default_schema_id() -> String {
    DEFAULT_SCHEMA_ID.to_string()
}

/// Credential type
///
/// Serialized as its lowercase name. Unknown names are preserved in
/// [`CredentialsType::Other`] so records written by newer deployments still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CredentialsType {
    Password,
    Oidc,
    Totp,
    Other(String),
}

impl CredentialsType {
    pub fn as_str(&self) -> &str {
        match self {
            CredentialsType::Password => "password",
            CredentialsType::Oidc => "oidc",
            CredentialsType::Totp => "totp",
            CredentialsType::Other(name) => name,
        }
    }
}

impl From<String> for CredentialsType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "password" => CredentialsType::Password,
            "oidc" => CredentialsType::Oidc,
            "totp" => CredentialsType::Totp,
            _ => CredentialsType::Other(value),
        }
    }
}

impl From<&str> for CredentialsType {
    fn from(value: &str) -> Self {
        CredentialsType::from(value.to_string())
    }
}

impl From<CredentialsType> for String {
    fn from(value: CredentialsType) -> Self {
        match value {
            CredentialsType::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CredentialsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential material for one credential type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "type")]
    pub credential_type: CredentialsType,
    /// Login identifiers bound to this credential (e.g. an email address)
    #[serde(default)]
    pub identifiers: Vec<String>,
    /// Type-specific configuration (password hash, provider subject, ...)
    #[serde(default)]
    pub config: Value,
}

impl Credentials {
    pub fn new(credential_type: CredentialsType, identifiers: Vec<String>, config: Value) -> Self {
        Self {
            credential_type,
            identifiers,
            config,
        }
    }
}

/// Identity traits: an open, schema-validated JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Traits(pub Value);

impl Traits {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a value by JSON pointer, e.g. `/email`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }
}

impl Default for Traits {
    fn default() -> Self {
        Traits(Value::Object(Default::default()))
    }
}

impl From<Value> for Traits {
    fn from(value: Value) -> Self {
        Traits(value)
    }
}

/// Delivery channel of a verifiable address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifiableAddressType {
    Email,
}

impl fmt::Display for VerifiableAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifiableAddressType::Email => f.write_str("email"),
        }
    }
}

/// A contact address whose ownership can be proven with a verification code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableAddress {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub value: String,
    pub via: VerifiableAddressType,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    /// Current verification code; replaced on every refresh
    pub code: String,
    /// Expiry of `code`
    pub expires_at: DateTime<Utc>,
}

impl VerifiableAddress {
    /// Create an unverified email address with a fresh verification code.
    ///
    /// Email values are stored lowercased.
    pub fn new_email(
        value: &str,
        identity_id: Uuid,
        lifespan: Duration,
    ) -> zid_crypto::Result<Self> {
        let code = zid_crypto::new_verify_code()?;
        Ok(Self {
            id: Uuid::new_v4(),
            identity_id,
            value: value.to_lowercase(),
            via: VerifiableAddressType::Email,
            verified: false,
            verified_at: None,
            code,
            expires_at: Utc::now() + lifespan,
        })
    }

    pub fn is_code_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Identity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default = "default_schema_id")]
    pub schema_id: String,
    #[serde(default)]
    pub traits: Traits,
    /// Only populated by confidential reads
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub credentials: HashMap<CredentialsType, Credentials>,
    /// `None` and `Some(vec![])` both mean "no addresses"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifiable_addresses: Option<Vec<VerifiableAddress>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create an identity with empty traits under the given schema.
    pub fn new(schema_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            schema_id: schema_id.into(),
            traits: Traits::default(),
            credentials: HashMap::new(),
            verifiable_addresses: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_traits(mut self, traits: impl Into<Traits>) -> Self {
        self.traits = traits.into();
        self
    }

    /// Insert or replace the credentials of `credentials.credential_type`.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials
            .insert(credentials.credential_type.clone(), credentials);
    }

    pub fn get_credentials(&self, credential_type: &CredentialsType) -> Option<&Credentials> {
        self.credentials.get(credential_type)
    }

    /// Addresses as a slice, treating an absent collection as empty.
    pub fn addresses(&self) -> &[VerifiableAddress] {
        self.verifiable_addresses.as_deref().unwrap_or_default()
    }

    /// Drop credentials so the record is safe to hand to non-privileged callers.
    pub fn without_credentials(mut self) -> Self {
        self.credentials.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_type_names() {
        assert_eq!(CredentialsType::Password.to_string(), "password");
        assert_eq!(CredentialsType::from("oidc"), CredentialsType::Oidc);
        assert_eq!(
            CredentialsType::from("webauthn"),
            CredentialsType::Other("webauthn".to_string())
        );
    }

    #[test]
    fn test_credentials_keyed_by_type_in_json() {
        let mut identity = Identity::new(DEFAULT_SCHEMA_ID);
        identity.set_credentials(Credentials::new(
            CredentialsType::Password,
            vec!["foo@example.com".to_string()],
            json!({ "hashed_password": "$argon2id$..." }),
        ));

        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["credentials"]["password"]["type"], "password");

        let decoded: Identity = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, identity);
    }

    #[test]
    fn test_schema_id_defaults() {
        let decoded: Identity = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "traits": { "name": "Alice" },
            "created_at": Utc::now(),
            "updated_at": Utc::now(),
        }))
        .unwrap();

        assert_eq!(decoded.schema_id, DEFAULT_SCHEMA_ID);
        assert!(decoded.credentials.is_empty());
        assert!(decoded.verifiable_addresses.is_none());
    }

    #[test]
    fn test_new_email_address() {
        let identity_id = Uuid::new_v4();
        let before = Utc::now();
        let address =
            VerifiableAddress::new_email("Foo@Example.com", identity_id, Duration::hours(1))
                .unwrap();

        assert_eq!(address.value, "foo@example.com");
        assert_eq!(address.identity_id, identity_id);
        assert!(!address.verified);
        assert!(address.expires_at > before);
        assert!(!address.is_code_expired());
        assert_eq!(address.code.len(), zid_crypto::VERIFY_CODE_LENGTH);
    }

    #[test]
    fn test_without_credentials() {
        let mut identity = Identity::new(DEFAULT_SCHEMA_ID);
        identity.set_credentials(Credentials::new(
            CredentialsType::Totp,
            vec![],
            json!({}),
        ));
        assert!(identity.without_credentials().credentials.is_empty());
    }
}
