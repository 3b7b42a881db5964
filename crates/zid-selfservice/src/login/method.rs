use crate::form::RequestMethodConfig;
use serde::{ser::Serializer, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use zid_identity_core::CredentialsType;

/// One credential method offered by a login request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMethod {
    pub method: CredentialsType,
    pub config: RequestMethodConfig,
}

impl RequestMethod {
    pub fn new(method: CredentialsType, config: RequestMethodConfig) -> Self {
        Self { method, config }
    }
}

/// Methods of a login request, in exactly one of two representations.
///
/// `Mapped` is the in-memory shape, keyed by credential type. `Flattened` is
/// the shape used while rows are written or read back, one entry per method.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestMethods {
    Mapped(BTreeMap<CredentialsType, RequestMethod>),
    Flattened(Vec<RequestMethod>),
}

impl Default for RequestMethods {
    fn default() -> Self {
        RequestMethods::Mapped(BTreeMap::new())
    }
}

impl RequestMethods {
    /// Switch to the flattened form. No-op when already flattened.
    pub fn flatten(&mut self) {
        if let RequestMethods::Mapped(map) = self {
            let entries = std::mem::take(map).into_values().collect();
            *self = RequestMethods::Flattened(entries);
        }
    }

    /// Switch back to the mapped form. A later entry replaces an earlier one
    /// with the same credential type. No-op when already mapped.
    pub fn rebuild(&mut self) {
        if let RequestMethods::Flattened(entries) = self {
            let mut map = BTreeMap::new();
            for entry in std::mem::take(entries) {
                map.insert(entry.method.clone(), entry);
            }
            *self = RequestMethods::Mapped(map);
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<CredentialsType, RequestMethod>> {
        match self {
            RequestMethods::Mapped(map) => Some(map),
            RequestMethods::Flattened(_) => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<CredentialsType, RequestMethod>> {
        match self {
            RequestMethods::Mapped(map) => Some(map),
            RequestMethods::Flattened(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestMethods::Mapped(map) => map.len(),
            RequestMethods::Flattened(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Both representations serialize as a map keyed by credential type.
impl Serialize for RequestMethods {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RequestMethods::Mapped(map) => map.serialize(serializer),
            RequestMethods::Flattened(entries) => {
                serializer.collect_map(entries.iter().map(|m| (&m.method, m)))
            }
        }
    }
}

impl<'de> Deserialize<'de> for RequestMethods {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::deserialize(deserializer).map(RequestMethods::Mapped)
    }
}
