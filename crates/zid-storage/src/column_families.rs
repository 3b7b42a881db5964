//! RocksDB column family definitions.

/// Identity rows without credentials or addresses: identity_id → IdentityRow
pub const CF_IDENTITIES: &str = "identities";

/// Credentials: (identity_id, credential_type) → Credentials
pub const CF_IDENTITY_CREDENTIALS: &str = "identity_credentials";

/// Credential identifier uniqueness index: (credential_type, identifier) → identity_id
pub const CF_CREDENTIAL_IDENTIFIERS: &str = "credential_identifiers";

/// Verifiable addresses: address_id → VerifiableAddress
pub const CF_VERIFIABLE_ADDRESSES: &str = "verifiable_addresses";

/// Login requests without their methods: request_id → LoginRequestRow
pub const CF_LOGIN_REQUESTS: &str = "login_requests";

/// Login request methods: (request_id, method) → method row
pub const CF_LOGIN_REQUEST_METHODS: &str = "login_request_methods";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        CF_IDENTITIES,
        CF_IDENTITY_CREDENTIALS,
        CF_CREDENTIAL_IDENTIFIERS,
        CF_VERIFIABLE_ADDRESSES,
        CF_LOGIN_REQUESTS,
        CF_LOGIN_REQUEST_METHODS,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_duplicate_column_families() {
        let cfs = all_column_families();
        let mut unique = std::collections::HashSet::new();

        for cf in &cfs {
            assert!(unique.insert(cf), "Duplicate column family: {}", cf);
        }
    }
}
