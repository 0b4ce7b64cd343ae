//! Configuration structures to map the cognito-demo.toml configuration.

#![deny(missing_docs)]

mod identity;
mod loader;
mod logins;

use std::{collections::BTreeMap, path::Path};

pub use identity::IdentityConfig;
pub use logins::{LoginConfig, LoginProvider};
use serde::Deserialize;

/// Main configuration structure for the demo application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Identity pool settings.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Social login settings, keyed by provider.
    #[serde(default)]
    pub logins: BTreeMap<LoginProvider, LoginConfig>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Settings for a single social login provider, if configured.
    pub fn login(&self, provider: &LoginProvider) -> Option<&LoginConfig> {
        self.logins.get(provider)
    }
}
