//! Social login providers, reduced to handing out access tokens.

use async_trait::async_trait;
use config::{Config, LoginConfig, LoginProvider};
use secrecy::SecretString;

/// A third-party login flow yielding an access token.
#[async_trait]
pub(crate) trait SocialLogin: Send + Sync {
    /// Log in with `provider`, asking for `permissions`. `None` means the login was
    /// cancelled or is not possible.
    async fn login(&self, provider: &LoginProvider, permissions: &[String]) -> Option<SecretString>;

    /// Permissions requested from a provider when the caller does not choose.
    fn permissions(&self, provider: &LoginProvider) -> Vec<String>;
}

/// Hands out the access tokens from the configuration file.
pub(crate) struct ConfiguredLogin {
    config: Config,
}

impl ConfiguredLogin {
    pub(crate) fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SocialLogin for ConfiguredLogin {
    async fn login(&self, provider: &LoginProvider, permissions: &[String]) -> Option<SecretString> {
        log::debug!("Login with {provider} requested permissions: {}", permissions.join(", "));

        let token = self.config.login(provider).and_then(|login| login.access_token.clone());

        if token.is_none() {
            log::warn!("No access token available for {provider}, login cancelled");
        }

        token
    }

    fn permissions(&self, provider: &LoginProvider) -> Vec<String> {
        self.config
            .login(provider)
            .map(|login| login.permissions.clone())
            .unwrap_or_else(|| LoginConfig::default().permissions)
    }
}
