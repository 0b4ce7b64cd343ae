//! Social login provider configuration.

use std::fmt;

use secrecy::SecretString;
use serde::Deserialize;

/// An external login provider that can upgrade an anonymous identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "String")]
pub enum LoginProvider {
    /// Facebook login.
    Facebook,
    /// Google sign-in.
    Google,
    /// Login with Amazon.
    Amazon,
    /// Any other provider, addressed by its login domain
    /// (e.g. a developer-authenticated provider name).
    Custom(String),
}

impl LoginProvider {
    /// The provider name the identity broker expects in its login map.
    pub fn login_domain(&self) -> &str {
        match self {
            LoginProvider::Facebook => "graph.facebook.com",
            LoginProvider::Google => "accounts.google.com",
            LoginProvider::Amazon => "www.amazon.com",
            LoginProvider::Custom(domain) => domain,
        }
    }
}

impl From<String> for LoginProvider {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "facebook" | "graph.facebook.com" => LoginProvider::Facebook,
            "google" | "accounts.google.com" => LoginProvider::Google,
            "amazon" | "www.amazon.com" => LoginProvider::Amazon,
            _ => LoginProvider::Custom(value),
        }
    }
}

impl From<&str> for LoginProvider {
    fn from(value: &str) -> Self {
        LoginProvider::from(value.to_string())
    }
}

impl fmt::Display for LoginProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginProvider::Facebook => f.write_str("facebook"),
            LoginProvider::Google => f.write_str("google"),
            LoginProvider::Amazon => f.write_str("amazon"),
            LoginProvider::Custom(domain) => f.write_str(domain),
        }
    }
}

/// Settings for one social login provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginConfig {
    /// Access token returned by the provider's login flow.
    /// Usually taken from the environment, e.g. `"{{ env.FACEBOOK_ACCESS_TOKEN }}"`.
    #[serde(default)]
    pub access_token: Option<SecretString>,
    /// Permissions requested when logging in.
    #[serde(default = "default_permissions")]
    pub permissions: Vec<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            permissions: default_permissions(),
        }
    }
}

fn default_permissions() -> Vec<String> {
    vec!["email".to_string()]
}
