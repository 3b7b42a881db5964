//! Protected-field comparison for unprivileged trait updates.

use crate::{
    errors::{IdentityError, Result},
    types::{Credentials, CredentialsType, Identity, VerifiableAddress},
};
use std::collections::HashMap;

/// Compare two credential sets.
///
/// Insensitive to map iteration order; sensitive to the set of credential
/// types and, per type, to the identifiers (in order) and the configuration.
pub fn credentials_equal(
    a: &HashMap<CredentialsType, Credentials>,
    b: &HashMap<CredentialsType, Credentials>,
) -> bool {
    if a.len() != b.len() {
        return false;
    }

    b.iter().all(|(credential_type, expected)| match a.get(credential_type) {
        Some(actual) => {
            actual.credential_type == expected.credential_type
                && actual.identifiers == expected.identifiers
                && actual.config == expected.config
        }
        None => false,
    })
}

/// Compare two address collections.
///
/// Element-wise deep equality, except that an absent collection and an empty
/// one are equal in every combination.
pub fn addresses_equal(
    a: &Option<Vec<VerifiableAddress>>,
    b: &Option<Vec<VerifiableAddress>>,
) -> bool {
    let len = |v: &Option<Vec<VerifiableAddress>>| v.as_ref().map_or(0, Vec::len);
    a == b || len(a) + len(b) == 0
}

/// Check `working` against `original` and restore it on violation.
///
/// On mismatch the whole identity, traits included, is reset to `original`.
pub(crate) fn guard_protected_fields(working: &mut Identity, original: Identity) -> Result<()> {
    if credentials_equal(&working.credentials, &original.credentials)
        && addresses_equal(&working.verifiable_addresses, &original.verifiable_addresses)
    {
        return Ok(());
    }

    *working = original;
    Err(IdentityError::ProtectedFieldModified)
}
