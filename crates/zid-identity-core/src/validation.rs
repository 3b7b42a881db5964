//! JSON-schema trait validator with credential and verification extensions.
//!
//! Schemas may annotate trait properties with a `zid` keyword:
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "email": {
//!       "type": "string",
//!       "format": "email",
//!       "zid": {
//!         "credentials": { "password": { "identifier": true } },
//!         "verification": { "via": "email" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! After a document passes validation, annotated values become identifiers of
//! the identity's password credential and verifiable addresses of the identity.
//! Because of this, an unprivileged trait update that changes such a value is
//! rejected by the manager's protected-field guard.

use crate::{
    errors::{FieldError, ValidateError, ValidationError},
    traits::TraitValidator,
    types::*,
};
use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Name of the extension keyword inside property schemas.
pub const EXTENSION_KEYWORD: &str = "zid";

/// A permissive schema used when no schema is configured.
pub fn default_schema() -> Value {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object"
    })
}

#[derive(Debug, Clone, PartialEq)]
struct TraitExtension {
    /// JSON pointer of the annotated property
    pointer: String,
    password_identifier: bool,
    verification_via: Option<VerifiableAddressType>,
}

struct CompiledSchema {
    validator: jsonschema::Validator,
    extensions: Vec<TraitExtension>,
}

/// [`TraitValidator`] backed by a registry of JSON schemas keyed by schema id
pub struct SchemaValidator {
    schemas: HashMap<String, CompiledSchema>,
    verification_lifespan: Duration,
}

impl SchemaValidator {
    /// Create an empty registry.
    ///
    /// `verification_lifespan` is the code validity of addresses created by
    /// the verification extension.
    pub fn new(verification_lifespan: Duration) -> Self {
        Self {
            schemas: HashMap::new(),
            verification_lifespan,
        }
    }

    /// Compile and register `schema` under `schema_id`, replacing any previous one.
    pub fn register(
        &mut self,
        schema_id: impl Into<String>,
        schema: &Value,
    ) -> Result<(), ValidateError> {
        let schema_id = schema_id.into();
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            ValidateError::Other(format!("invalid identity schema \"{}\": {}", schema_id, e))
        })?;

        let mut extensions = Vec::new();
        collect_extensions(schema, "", &mut extensions);
        debug!(
            "Registered identity schema {} with {} extension(s)",
            schema_id,
            extensions.len()
        );

        self.schemas.insert(
            schema_id,
            CompiledSchema {
                validator,
                extensions,
            },
        );
        Ok(())
    }

    pub fn with_schema(
        mut self,
        schema_id: impl Into<String>,
        schema: &Value,
    ) -> Result<Self, ValidateError> {
        self.register(schema_id, schema)?;
        Ok(self)
    }

    fn check_schema(
        &self,
        schema_id: &str,
        compiled: &CompiledSchema,
        traits: &Value,
    ) -> Result<(), ValidateError> {
        let causes: Vec<FieldError> = compiled
            .validator
            .iter_errors(traits)
            .map(|error| FieldError {
                instance_path: error.instance_path.to_string(),
                message: error.to_string(),
            })
            .collect();

        if causes.is_empty() {
            Ok(())
        } else {
            Err(ValidateError::Schema(ValidationError::new(schema_id, causes)))
        }
    }

    fn apply_extensions(
        &self,
        extensions: &[TraitExtension],
        identity: &mut Identity,
    ) -> Result<(), ValidateError> {
        if extensions.is_empty() {
            return Ok(());
        }

        let mut identifiers: Vec<String> = Vec::new();
        let mut addresses: Vec<(VerifiableAddressType, String)> = Vec::new();

        for extension in extensions {
            let Some(Value::String(value)) = identity.traits.pointer(&extension.pointer) else {
                continue;
            };
            // Identifiers and addresses are case-insensitive.
            let value = value.to_lowercase();
            if extension.password_identifier && !identifiers.contains(&value) {
                identifiers.push(value.clone());
            }
            if let Some(via) = extension.verification_via {
                if !addresses.iter().any(|(v, a)| *v == via && *a == value) {
                    addresses.push((via, value));
                }
            }
        }

        if extensions.iter().any(|e| e.password_identifier) {
            if let Some(password) = identity.credentials.get_mut(&CredentialsType::Password) {
                password.identifiers = identifiers;
            }
        }

        if extensions.iter().any(|e| e.verification_via.is_some()) {
            let existing = identity.verifiable_addresses.take().unwrap_or_default();
            let mut rebuilt = Vec::with_capacity(addresses.len());
            for (via, value) in addresses {
                match existing.iter().find(|a| a.via == via && a.value == value) {
                    Some(address) => rebuilt.push(address.clone()),
                    None => rebuilt.push(
                        VerifiableAddress::new_email(
                            &value,
                            identity.id,
                            self.verification_lifespan,
                        )
                        .map_err(|e| ValidateError::Other(e.to_string()))?,
                    ),
                }
            }
            identity.verifiable_addresses = Some(rebuilt);
        }

        Ok(())
    }
}

#[async_trait]
impl TraitValidator for SchemaValidator {
    async fn validate(&self, identity: &mut Identity) -> Result<(), ValidateError> {
        let compiled = self.schemas.get(&identity.schema_id).ok_or_else(|| {
            ValidateError::Other(format!("unknown identity schema \"{}\"", identity.schema_id))
        })?;

        self.check_schema(&identity.schema_id, compiled, identity.traits.as_value())?;
        self.apply_extensions(&compiled.extensions, identity)
    }
}

/// Walk `properties` recursively and record every property carrying the
/// extension keyword.
fn collect_extensions(schema: &Value, pointer: &str, out: &mut Vec<TraitExtension>) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };

    for (name, property) in properties {
        let path = format!("{}/{}", pointer, escape_pointer_token(name));

        if let Some(extension) = property.get(EXTENSION_KEYWORD) {
            let password_identifier = extension
                .pointer("/credentials/password/identifier")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let verification_via = match extension.pointer("/verification/via") {
                Some(Value::String(via)) if via == "email" => Some(VerifiableAddressType::Email),
                _ => None,
            };

            if password_identifier || verification_via.is_some() {
                out.push(TraitExtension {
                    pointer: path.clone(),
                    password_identifier,
                    verification_via,
                });
            }
        }

        collect_extensions(property, &path, out);
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
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
                "name": { "type": "string" },
                "profile": {
                    "type": "object",
                    "properties": {
                        "a/b": { "type": "string", "zid": { "verification": { "via": "email" } } }
                    }
                }
            },
            "required": ["email"]
        })
    }

    fn validator() -> SchemaValidator {
        SchemaValidator::new(Duration::hours(1))
            .with_schema(DEFAULT_SCHEMA_ID, &schema())
            .unwrap()
    }

    fn identity(traits: Value) -> Identity {
        let mut identity = Identity::new(DEFAULT_SCHEMA_ID).with_traits(traits);
        identity.set_credentials(Credentials::new(
            CredentialsType::Password,
            vec![],
            json!({ "hashed_password": "h" }),
        ));
        identity
    }

    #[test]
    fn test_collect_extensions() {
        let mut out = Vec::new();
        collect_extensions(&schema(), "", &mut out);

        assert_eq!(out.len(), 2);
        let email = out.iter().find(|e| e.pointer == "/email").unwrap();
        assert!(email.password_identifier);
        assert_eq!(email.verification_via, Some(VerifiableAddressType::Email));
        let nested = out.iter().find(|e| e.pointer == "/profile/a~1b").unwrap();
        assert!(!nested.password_identifier);
    }

    #[tokio::test]
    async fn test_valid_traits_fill_identifiers_and_addresses() {
        let mut identity = identity(json!({ "email": "Foo@Example.com", "name": "Foo" }));
        validator().validate(&mut identity).await.unwrap();

        let password = identity.get_credentials(&CredentialsType::Password).unwrap();
        assert_eq!(password.identifiers, vec!["foo@example.com".to_string()]);

        let addresses = identity.addresses();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].value, "foo@example.com");
        assert_eq!(addresses[0].identity_id, identity.id);
    }

    #[tokio::test]
    async fn test_revalidation_is_stable() {
        let validator = validator();
        let mut identity = identity(json!({ "email": "foo@example.com" }));
        validator.validate(&mut identity).await.unwrap();

        let before = identity.clone();
        validator.validate(&mut identity).await.unwrap();
        assert_eq!(identity, before);
    }

    #[tokio::test]
    async fn test_schema_violation_is_structured() {
        let mut identity = identity(json!({ "name": 42 }));
        let err = validator().validate(&mut identity).await.unwrap_err();

        let ValidateError::Schema(err) = err else {
            panic!("expected schema error, got {err:?}");
        };
        assert_eq!(err.schema_id, DEFAULT_SCHEMA_ID);
        assert!(err.causes.len() >= 2);
        assert!(err.causes.iter().any(|c| c.instance_path == "/name"));
    }

    #[tokio::test]
    async fn test_unknown_schema_is_opaque() {
        let mut identity = Identity::new("missing");
        let err = validator().validate(&mut identity).await.unwrap_err();
        assert!(matches!(err, ValidateError::Other(_)));
    }

    #[tokio::test]
    async fn test_no_extensions_leaves_protected_fields() {
        let validator = SchemaValidator::new(Duration::hours(1))
            .with_schema(DEFAULT_SCHEMA_ID, &default_schema())
            .unwrap();
        let mut identity = identity(json!({ "anything": true }));
        let before = identity.clone();

        validator.validate(&mut identity).await.unwrap();
        assert_eq!(identity, before);
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let result = SchemaValidator::new(Duration::hours(1))
            .register(DEFAULT_SCHEMA_ID, &json!({ "type": 12 }));
        assert!(matches!(result, Err(ValidateError::Other(_))));
    }
}
