//! Request identity derivation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical identity of a cacheable request.
///
/// Two logically identical requests always produce the same key: parameters
/// live in a `BTreeMap`, so insertion order is irrelevant, and `None` values
/// are dropped before they ever reach the map. A request with no parameters
/// and one with an empty parameter set are the same key.
///
/// Keys stay human-readable (`GET /api-keys?projectId=p1`) instead of being
/// hashed: endpoint-family invalidation matches on their structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    method: String,
    endpoint: String,
    params: BTreeMap<String, String>,
}

impl RequestKey {
    /// Create a key for an arbitrary method.
    ///
    /// # Panics
    ///
    /// Panics if `endpoint` is empty or does not start with `/` — a
    /// malformed key is a programmer bug, caught before any I/O.
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        assert!(
            endpoint.starts_with('/'),
            "endpoint must be a non-empty path starting with '/', got {endpoint:?}"
        );
        Self {
            method: method.into().to_ascii_uppercase(),
            endpoint,
            params: BTreeMap::new(),
        }
    }

    /// Shorthand for the common idempotent-read case.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new("GET", endpoint)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a parameter only if present; `None` is dropped so that it cannot
    /// split the key space.
    pub fn with_opt_param(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with_param(name, v),
            None => self,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Query parameters in canonical (sorted) order, ready for the transport.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// True when the key addresses `endpoint` exactly, regardless of params.
    pub fn matches_endpoint(&self, endpoint: &str) -> bool {
        self.endpoint == endpoint
    }

    /// True when the key's endpoint starts with `prefix` (endpoint-family
    /// matching, e.g. everything under `/api-keys`).
    pub fn endpoint_starts_with(&self, prefix: &str) -> bool {
        self.endpoint.starts_with(prefix)
    }

    pub fn has_param(&self, name: &str, value: &str) -> bool {
        self.param(name) == Some(value)
    }

    /// The canonical string form used for logs and debugging.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        let mut sep = '?';
        for (k, v) in &self.params {
            write!(f, "{sep}{k}={v}")?;
            sep = '&';
        }
        Ok(())
    }
}
