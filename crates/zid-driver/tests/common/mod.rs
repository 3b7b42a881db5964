#![allow(dead_code)]

use http::{header::HOST, request::Parts, Request};
use serde_json::json;
use std::collections::HashMap;
use tempfile::TempDir;
use zid_driver::{Config, Registry};

/// Identity schema used by the integration tests: the email trait is both the
/// password identifier and a verifiable address.
pub fn identity_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "properties": {
            "email": {
                "type": "string",
                "format": "email",
                "zid": {
                    "credentials": { "password": { "identifier": true } },
                    "verification": { "via": "email" }
                }
            },
            "name": { "type": "string" }
        },
        "required": ["email"],
        "additionalProperties": false
    })
}

/// A registry over a throwaway database and schema file
pub struct TestEnvironment {
    pub registry: Registry,
    _dir: TempDir,
}

impl TestEnvironment {
    pub fn start() -> Result<Self, Box<dyn std::error::Error>> {
        Self::start_with(&[])
    }

    /// Start with extra configuration variables layered over the defaults.
    pub fn start_with(vars: &[(&str, &str)]) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let schema_path = dir.path().join("identity.schema.json");
        std::fs::write(&schema_path, serde_json::to_vec(&identity_schema())?)?;

        let mut env: HashMap<String, String> = HashMap::new();
        env.insert(
            "DATABASE_PATH".into(),
            dir.path().join("zid.db").display().to_string(),
        );
        env.insert(
            "IDENTITY_SCHEMA_PATH".into(),
            schema_path.display().to_string(),
        );
        for (key, value) in vars {
            env.insert(key.to_string(), value.to_string());
        }

        let config = Config::from_lookup(|key| env.get(key).cloned())?;
        let registry = Registry::open(config)?;

        Ok(Self {
            registry,
            _dir: dir,
        })
    }
}

pub fn browser_request(path: &str) -> Parts {
    Request::get(path)
        .header(HOST, "auth.example.com")
        .body(())
        .map(|r| r.into_parts().0)
        .expect("valid request")
}
