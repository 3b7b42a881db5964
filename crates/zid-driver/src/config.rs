use anyhow::{Context as _, Result};
use chrono::Duration;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to RocksDB database
    pub database_path: PathBuf,

    /// JSON schema file for the default identity schema
    pub identity_schema_path: Option<PathBuf>,

    /// Validity of verification codes (seconds)
    pub verification_link_lifespan: i64,

    /// Validity of login requests (seconds)
    pub login_request_lifespan: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("DATABASE_PATH")
            .unwrap_or_else(|| "./data/zid.db".to_string())
            .into();

        let identity_schema_path = lookup("IDENTITY_SCHEMA_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let verification_link_lifespan = parse_seconds(
            &lookup,
            "VERIFICATION_LINK_LIFESPAN_SECONDS",
            86_400, // 24 hours
        )?;

        let login_request_lifespan = parse_seconds(
            &lookup,
            "LOGIN_REQUEST_LIFESPAN_SECONDS",
            3_600, // 1 hour
        )?;

        Ok(Config {
            database_path,
            identity_schema_path,
            verification_link_lifespan,
            login_request_lifespan,
        })
    }

    pub fn verification_link_lifespan(&self) -> Duration {
        Duration::seconds(self.verification_link_lifespan)
    }

    pub fn login_request_lifespan(&self) -> Duration {
        Duration::seconds(self.login_request_lifespan)
    }
}

fn parse_seconds<F>(lookup: &F, key: &str, default: i64) -> Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    let seconds: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds", key))?;
    if seconds <= 0 {
        anyhow::bail!("{} must be positive", key);
    }
    // Keep `now + lifespan` representable.
    if seconds > Duration::days(365 * 100).num_seconds() {
        anyhow::bail!("{} is out of range", key);
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./data/zid.db"));
        assert!(config.identity_schema_path.is_none());
        assert_eq!(config.verification_link_lifespan(), Duration::hours(24));
        assert_eq!(config.login_request_lifespan(), Duration::hours(1));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_PATH", "/var/lib/zid"),
            ("IDENTITY_SCHEMA_PATH", "/etc/zid/identity.schema.json"),
            ("VERIFICATION_LINK_LIFESPAN_SECONDS", "600"),
            ("LOGIN_REQUEST_LIFESPAN_SECONDS", " 120 "),
        ])
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/zid"));
        assert_eq!(
            config.identity_schema_path,
            Some(PathBuf::from("/etc/zid/identity.schema.json"))
        );
        assert_eq!(config.verification_link_lifespan(), Duration::minutes(10));
        assert_eq!(config.login_request_lifespan(), Duration::minutes(2));
    }

    #[test]
    fn test_rejects_bad_lifespans() {
        assert!(load(&[("LOGIN_REQUEST_LIFESPAN_SECONDS", "soon")]).is_err());
        assert!(load(&[("LOGIN_REQUEST_LIFESPAN_SECONDS", "0")]).is_err());
        assert!(load(&[("VERIFICATION_LINK_LIFESPAN_SECONDS", "-5")]).is_err());
        assert!(load(&[("VERIFICATION_LINK_LIFESPAN_SECONDS", "99999999999999")]).is_err());
    }
}
