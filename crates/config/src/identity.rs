//! Identity pool configuration.

use serde::Deserialize;
use url::Url;

/// Settings binding a client to one identity pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Identity pool id, in the form `<region>:<uuid>`.
    /// Left empty by default; a client refuses to initialize without it.
    pub pool_id: String,
    /// AWS region hosting the identity pool.
    pub region: String,
    /// Custom endpoint URL (optional - for local emulators).
    pub endpoint_url: Option<Url>,
}

impl IdentityConfig {
    /// Creates a configuration for the given pool and region.
    pub fn new(pool_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            region: region.into(),
            endpoint_url: None,
        }
    }

    /// The region prefix of the pool id, if the id carries one.
    pub fn pool_region(&self) -> Option<&str> {
        self.pool_id
            .split_once(':')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
    }

    /// The pool's own region when it differs from the configured one.
    ///
    /// Requests go to the configured region, where such a pool does not exist.
    pub fn mismatched_pool_region(&self) -> Option<&str> {
        self.pool_region().filter(|pool_region| *pool_region != self.region)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            pool_id: String::new(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
        }
    }
}
