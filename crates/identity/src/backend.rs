mod cognito;

pub use cognito::CognitoBackend;

use async_trait::async_trait;
use config::IdentityConfig;
use secrecy::SecretString;

use crate::{error::BackendError, event::IdentityListener};

/// An identity-brokering service able to construct federated credentials.
///
/// Note for async_trait: the client holds backends as trait objects, so the trait
/// must stay dyn-compatible.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Construct credentials bound to one identity pool.
    async fn connect(&self, config: &IdentityConfig) -> Result<Box<dyn FederatedIdentity>, BackendError>;
}

/// Federated credentials for a single end-user of an identity pool.
///
/// Implementations hold the cached identity id and the login map. Whenever a call
/// assigns an identity id different from the cached one, the registered listener
/// must be invoked before that call returns.
#[async_trait]
pub trait FederatedIdentity: Send + Sync {
    /// The identity id known locally, empty if none was assigned yet. Does not
    /// contact the broker.
    fn cached_identity_id(&self) -> Result<String, BackendError>;

    /// Register an access token issued by an external login provider.
    fn add_login(&mut self, provider: &str, access_token: SecretString);

    /// Names of the providers with a registered access token.
    fn login_providers(&self) -> Vec<String>;

    /// Register the identity change listener, replacing any previous one.
    fn on_identity_changed(&mut self, listener: IdentityListener);

    /// Fetch the identity id from the broker.
    async fn identity_id(&mut self) -> Result<String, BackendError>;

    /// Forget the cached identity id and all logins.
    fn clear(&mut self);
}
