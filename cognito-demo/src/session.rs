//! Login state of the demo, owned by the front end rather than the identity client.

use std::{fmt, sync::Arc};

use config::{IdentityConfig, LoginProvider};
use identity::{IdentityBackend, IdentityClient, IdentityError, ProviderLogin};
use secrecy::SecretString;

use crate::social::SocialLogin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    LoggedOut,
    Loading,
    LoggedIn,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::LoggedOut => f.write_str("logged out"),
            SessionState::Loading => f.write_str("loading"),
            SessionState::LoggedIn => f.write_str("logged in"),
        }
    }
}

/// Drives an [`IdentityClient`] through `LoggedOut → Loading → LoggedIn`.
///
/// Configuration and initialization errors end in `LoggedOut` and are only logged.
/// Refresh errors are logged and returned.
pub(crate) struct Session {
    backend: Arc<dyn IdentityBackend>,
    config: IdentityConfig,
    social: Box<dyn SocialLogin>,
    client: IdentityClient,
    state: SessionState,
}

impl Session {
    pub(crate) fn new(backend: Arc<dyn IdentityBackend>, config: IdentityConfig, social: Box<dyn SocialLogin>) -> Self {
        let client = IdentityClient::new(backend.clone());

        Self {
            backend,
            config,
            social,
            client,
            state: SessionState::LoggedOut,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn identity(&self) -> String {
        self.client.identity()
    }

    pub(crate) fn login_providers(&self) -> Vec<String> {
        self.client.login_providers()
    }

    /// Pool settings of the current credentials, `None` while logged out.
    pub(crate) fn configuration(&self) -> Option<&IdentityConfig> {
        self.client.configuration()
    }

    /// Continue with an anonymous identity.
    pub(crate) async fn skip_authentication(&mut self) {
        if !self.expect_logged_out() {
            return;
        }

        self.state = SessionState::Loading;
        self.init(None).await;
    }

    /// Log in with a social provider and use its token for an authenticated identity.
    ///
    /// Without an explicit token the configured social login is asked for one.
    pub(crate) async fn login(&mut self, provider: LoginProvider, access_token: Option<SecretString>) {
        if !self.expect_logged_out() {
            return;
        }

        self.state = SessionState::Loading;

        let access_token = match access_token {
            Some(token) => Some(token),
            None => {
                let permissions = self.social.permissions(&provider);
                self.social.login(&provider, &permissions).await
            }
        };

        log::info!("{provider} login completed");

        match access_token {
            Some(token) => self.init(Some(ProviderLogin::new(&provider, token))).await,
            None => self.state = SessionState::LoggedOut,
        }
    }

    /// Fetch the identity id again.
    pub(crate) async fn get_identity(&mut self) -> Result<String, IdentityError> {
        if self.state != SessionState::LoggedIn {
            return Err(IdentityError::NotInitialized);
        }

        self.refresh().await
    }

    pub(crate) fn clear_identity(&mut self) {
        self.client.clear();
    }

    /// Drop the credentials and start over with a fresh client.
    pub(crate) fn logout(&mut self) {
        self.client.clear();
        self.client = IdentityClient::new(self.backend.clone());
        self.state = SessionState::LoggedOut;
    }

    async fn init(&mut self, login: Option<ProviderLogin>) {
        if let Err(error) = self.client.initialize(&self.config, login).await {
            log::error!("{error}");
            self.state = SessionState::LoggedOut;
            return;
        }

        self.state = SessionState::LoggedIn;

        // The first fetch is best effort, a failure keeps the session logged in.
        if self.refresh().await.is_err() {
            log::warn!("Continuing with the cached identity, use 'get-id' to try again");
        }
    }

    async fn refresh(&mut self) -> Result<String, IdentityError> {
        self.state = SessionState::Loading;
        let result = self.client.refresh_identity().await;
        self.state = SessionState::LoggedIn;

        if let Err(error) = &result {
            log::error!("{error}");
        }

        result
    }

    fn expect_logged_out(&self) -> bool {
        if self.state == SessionState::LoggedOut {
            return true;
        }

        log::warn!("Already {}, log out first", self.state);
        false
    }
}
