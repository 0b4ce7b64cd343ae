use std::sync::{Arc, PoisonError, RwLock};

use config::{IdentityConfig, LoginProvider};
use secrecy::SecretString;

use crate::{
    backend::{FederatedIdentity, IdentityBackend},
    error::IdentityError,
    event::IdentityChangedEvent,
};

/// An access token issued by an external login provider.
#[derive(Debug, Clone)]
pub struct ProviderLogin {
    /// Provider name as the broker expects it, e.g. `graph.facebook.com`.
    pub provider: String,
    /// Token returned by the provider's login flow.
    pub access_token: SecretString,
}

impl ProviderLogin {
    pub fn new(provider: &LoginProvider, access_token: SecretString) -> Self {
        Self {
            provider: provider.login_domain().to_string(),
            access_token,
        }
    }
}

/// Manages one set of federated credentials and the identity id derived from them.
///
/// The client is used from a single logical caller. The cached identity is shared
/// with the credentials' change listener only, which may overwrite it from inside a
/// backend call.
pub struct IdentityClient {
    backend: Arc<dyn IdentityBackend>,
    configuration: Option<IdentityConfig>,
    credentials: Option<Box<dyn FederatedIdentity>>,
    identity: Arc<RwLock<String>>,
}

impl IdentityClient {
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        Self {
            backend,
            configuration: None,
            credentials: None,
            identity: Arc::new(RwLock::new(String::new())),
        }
    }

    /// Construct credentials bound to `configuration`, anonymous unless a provider login is given.
    ///
    /// The cached identity is read from the new credentials and may be empty until the
    /// first [`refresh_identity`](Self::refresh_identity). Any previous credentials are
    /// replaced. On error the client is left uninitialized with an empty identity.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Configuration`] if the pool id is empty.
    /// - [`IdentityError::Initialization`] if the backend cannot construct the credentials
    ///   or read the cached identity.
    pub async fn initialize(
        &mut self,
        configuration: &IdentityConfig,
        provider: Option<ProviderLogin>,
    ) -> crate::Result<()> {
        match self.connect(configuration, provider).await {
            Ok((credentials, cached)) => {
                self.set_identity(cached);
                self.credentials = Some(credentials);
                self.configuration = Some(configuration.clone());

                Ok(())
            }
            Err(error) => {
                self.credentials = None;
                self.configuration = None;
                self.set_identity(String::new());

                Err(error)
            }
        }
    }

    async fn connect(
        &self,
        configuration: &IdentityConfig,
        provider: Option<ProviderLogin>,
    ) -> crate::Result<(Box<dyn FederatedIdentity>, String)> {
        if configuration.pool_id.is_empty() {
            return Err(IdentityError::Configuration("Identity pool id is not set".to_string()));
        }

        let mut credentials = self
            .backend
            .connect(configuration)
            .await
            .map_err(IdentityError::Initialization)?;

        let cached = credentials
            .cached_identity_id()
            .map_err(IdentityError::Initialization)?;

        let identity = Arc::clone(&self.identity);

        credentials.on_identity_changed(Box::new(move |event: &IdentityChangedEvent| {
            log::info!(
                "Identity changed (old: '{}', new: '{}')",
                event.old_identity,
                event.new_identity
            );

            *identity.write().unwrap_or_else(PoisonError::into_inner) = event.new_identity.clone();
        }));

        if let Some(login) = provider {
            log::debug!("Registering login for provider '{}'", login.provider);
            credentials.add_login(&login.provider, login.access_token);
        }

        Ok((credentials, cached))
    }

    /// Fetch the identity id from the broker and cache it.
    ///
    /// Identity change notifications fired during the request are applied before this
    /// future completes. On failure the cached identity is left untouched.
    pub async fn refresh_identity(&mut self) -> crate::Result<String> {
        let credentials = self.credentials.as_mut().ok_or(IdentityError::NotInitialized)?;

        let identity = credentials.identity_id().await.map_err(IdentityError::Refresh)?;

        log::info!("GetIdentity result: '{identity}'");

        self.set_identity(identity.clone());

        Ok(identity)
    }

    /// Forget the cached identity and all logins. Makes no network call.
    pub fn clear(&mut self) {
        if let Some(credentials) = self.credentials.as_mut() {
            credentials.clear();
        }

        self.set_identity(String::new());
    }

    /// The cached identity id, empty if none is known.
    pub fn identity(&self) -> String {
        self.identity.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.credentials.is_some()
    }

    /// The configuration of the current credentials.
    pub fn configuration(&self) -> Option<&IdentityConfig> {
        self.configuration.as_ref()
    }

    /// Providers with a registered login.
    pub fn login_providers(&self) -> Vec<String> {
        self.credentials
            .as_ref()
            .map(|credentials| credentials.login_providers())
            .unwrap_or_default()
    }

    fn set_identity(&self, identity: String) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = identity;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use config::{IdentityConfig, LoginProvider};
    use secrecy::SecretString;

    use super::{IdentityClient, ProviderLogin};
    use crate::{
        error::{BackendError, IdentityError},
        mock::MockBackend,
    };

    fn config() -> IdentityConfig {
        IdentityConfig::new("us-east-1:abc", "us-east-1")
    }

    fn client(backend: &MockBackend) -> IdentityClient {
        IdentityClient::new(Arc::new(backend.clone()))
    }

    fn facebook_login(token: &str) -> ProviderLogin {
        ProviderLogin::new(&LoginProvider::Facebook, SecretString::from(token.to_string()))
    }

    #[tokio::test]
    async fn anonymous_identity_flow() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Ok("anon:456".to_string()));

        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();
        assert_eq!(client.identity(), "anon:123");

        let identity = client.refresh_identity().await.unwrap();
        assert_eq!(identity, "anon:456");
        assert_eq!(client.identity(), "anon:456");

        client.clear();
        assert_eq!(client.identity(), "");
    }

    #[tokio::test]
    async fn empty_pool_id_is_a_configuration_error() {
        let backend = MockBackend::new().with_cached_identity("anon:123");
        let mut client = client(&backend);

        for region in ["us-east-1", "eu-west-1", ""] {
            let result = client.initialize(&IdentityConfig::new("", region), None).await;

            assert!(matches!(result, Err(IdentityError::Configuration(_))));
            assert!(!client.is_initialized());
            assert_eq!(client.identity(), "");
        }

        assert!(backend.connected_pools().is_empty());
    }

    #[tokio::test]
    async fn failed_reinitialization_logs_the_client_out() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Ok("anon:456".to_string()));
        let mut client = client(&backend);

        client.initialize(&config(), Some(facebook_login("fb-token"))).await.unwrap();
        assert_eq!(client.identity(), "anon:123");

        let result = client.initialize(&IdentityConfig::new("", "us-east-1"), None).await;

        assert!(matches!(result, Err(IdentityError::Configuration(_))));
        assert!(!client.is_initialized());
        assert!(client.configuration().is_none());
        assert!(client.login_providers().is_empty());
        assert_eq!(client.identity(), "");

        assert!(matches!(
            client.refresh_identity().await,
            Err(IdentityError::NotInitialized)
        ));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn backend_failure_on_reinitialization_logs_the_client_out() {
        let backend = MockBackend::new().with_cached_identity("anon:123");
        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();
        backend.fail_connect(BackendError::Connection("unreachable".to_string()));

        let result = client.initialize(&config(), None).await;

        assert!(matches!(
            result,
            Err(IdentityError::Initialization(BackendError::Connection(_)))
        ));
        assert!(!client.is_initialized());
        assert!(client.configuration().is_none());
        assert_eq!(client.identity(), "");
    }

    #[tokio::test]
    async fn reinitialization_replaces_the_credentials() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Ok("auth:789".to_string()));
        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();

        let other_pool = IdentityConfig::new("eu-west-1:def", "eu-west-1");
        client.initialize(&other_pool, Some(facebook_login("fb-token"))).await.unwrap();

        assert_eq!(
            backend.connected_pools(),
            vec!["us-east-1:abc".to_string(), "eu-west-1:def".to_string()]
        );
        assert_eq!(client.configuration(), Some(&other_pool));
        assert_eq!(client.login_providers(), vec!["graph.facebook.com".to_string()]);
        assert_eq!(client.refresh_identity().await.unwrap(), "auth:789");
    }

    #[tokio::test]
    async fn cached_identity_may_be_empty() {
        let backend = MockBackend::new();
        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();

        assert!(client.is_initialized());
        assert_eq!(client.identity(), "");
        assert_eq!(backend.connected_pools(), vec!["us-east-1:abc".to_string()]);
    }

    #[tokio::test]
    async fn connect_failure_leaves_client_uninitialized() {
        let backend = MockBackend::new().with_connect_error(BackendError::InvalidRegion("moon-1".to_string()));
        let mut client = client(&backend);

        let result = client.initialize(&config(), None).await;

        assert!(matches!(
            result,
            Err(IdentityError::Initialization(BackendError::InvalidRegion(_)))
        ));
        assert!(!client.is_initialized());
        assert!(client.configuration().is_none());
        assert_eq!(client.identity(), "");
    }

    #[tokio::test]
    async fn cached_read_failure_is_an_initialization_error() {
        let backend = MockBackend::new()
            .with_cached_identity_error(BackendError::Connection("unreachable".to_string()));
        let mut client = client(&backend);

        let result = client.initialize(&config(), Some(facebook_login("fb-token"))).await;

        assert!(matches!(result, Err(IdentityError::Initialization(_))));
        assert!(!client.is_initialized());
        assert!(backend.login_providers().is_empty());
    }

    #[tokio::test]
    async fn provider_login_is_registered_on_initialize() {
        let backend = MockBackend::new();
        let mut client = client(&backend);

        client.initialize(&config(), Some(facebook_login("fb-token"))).await.unwrap();

        assert_eq!(client.login_providers(), vec!["graph.facebook.com".to_string()]);
        assert_eq!(backend.access_token("graph.facebook.com").as_deref(), Some("fb-token"));
    }

    #[tokio::test]
    async fn refresh_sets_exactly_the_backend_value() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Ok("auth:789".to_string()));
        let mut client = client(&backend);

        client.initialize(&config(), Some(facebook_login("fb-token"))).await.unwrap();
        client.refresh_identity().await.unwrap();

        assert_eq!(client.identity(), "auth:789");
        assert_eq!(client.login_providers(), vec!["graph.facebook.com".to_string()]);
        assert_eq!(client.configuration(), Some(&config()));
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_is_returned_and_keeps_identity() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Err(BackendError::NotAuthorized("token expired".to_string())));
        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();
        let error = client.refresh_identity().await.unwrap_err();

        insta::assert_snapshot!(error.to_string(), @"Failed to refresh identity: Not authorized: token expired");
        assert_eq!(client.identity(), "anon:123");
    }

    #[tokio::test]
    async fn refresh_requires_initialization() {
        let backend = MockBackend::new().with_response(Ok("anon:456".to_string()));
        let mut client = client(&backend);

        let result = client.refresh_identity().await;

        assert!(matches!(result, Err(IdentityError::NotInitialized)));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn change_notification_updates_identity_immediately() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Ok("auth:789".to_string()));
        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();

        backend.notify_identity_changed("anon:456");
        assert_eq!(client.identity(), "anon:456");

        client.refresh_identity().await.unwrap();
        assert_eq!(client.identity(), "auth:789");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let backend = MockBackend::new().with_cached_identity("anon:123");
        let mut client = client(&backend);

        client.clear();
        assert_eq!(client.identity(), "");

        client.initialize(&config(), Some(facebook_login("fb-token"))).await.unwrap();

        for _ in 0..3 {
            client.clear();

            assert_eq!(client.identity(), "");
            assert!(client.login_providers().is_empty());
            assert_eq!(backend.cached_identity(), "");
        }

        assert!(client.is_initialized());
    }

    #[tokio::test]
    async fn refresh_after_clear_fetches_a_new_identity() {
        let backend = MockBackend::new()
            .with_cached_identity("anon:123")
            .with_response(Ok("anon:999".to_string()));
        let mut client = client(&backend);

        client.initialize(&config(), None).await.unwrap();
        client.clear();

        assert_eq!(client.refresh_identity().await.unwrap(), "anon:999");
        assert_eq!(client.identity(), "anon:999");
    }
}
