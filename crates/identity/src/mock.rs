//! In-memory identity broker for tests.
//!
//! The backend and every credentials object it hands out share one state, so a test
//! can script responses, inspect logins and fire identity change notifications while
//! the credentials are owned by a client.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use config::IdentityConfig;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    backend::{FederatedIdentity, IdentityBackend},
    error::BackendError,
    event::{IdentityChangedEvent, IdentityListener},
};

#[derive(Default)]
struct MockState {
    cached_identity: String,
    cached_identity_error: Option<BackendError>,
    connect_error: Option<BackendError>,
    responses: VecDeque<Result<String, BackendError>>,
    logins: BTreeMap<String, SecretString>,
    listener: Option<IdentityListener>,
    connected_pools: Vec<String>,
    requests: usize,
}

impl MockState {
    fn assign(&mut self, identity: &str) {
        if self.cached_identity == identity {
            return;
        }

        let old = std::mem::replace(&mut self.cached_identity, identity.to_string());

        if let Some(listener) = &self.listener {
            listener(&IdentityChangedEvent::new(old, identity));
        }
    }
}

/// Scripted identity broker.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity id returned by the synchronous cached read.
    pub fn with_cached_identity(self, identity: impl Into<String>) -> Self {
        self.lock().cached_identity = identity.into();
        self
    }

    /// Make the synchronous cached read fail.
    pub fn with_cached_identity_error(self, error: BackendError) -> Self {
        self.lock().cached_identity_error = Some(error);
        self
    }

    /// Make constructing credentials fail.
    pub fn with_connect_error(self, error: BackendError) -> Self {
        self.fail_connect(error);
        self
    }

    /// Make every later attempt to construct credentials fail.
    pub fn fail_connect(&self, error: BackendError) {
        self.lock().connect_error = Some(error);
    }

    /// Queue the result of the next identity fetch.
    pub fn with_response(self, response: Result<String, BackendError>) -> Self {
        self.push_response(response);
        self
    }

    /// Queue the result of the next identity fetch.
    pub fn push_response(&self, response: Result<String, BackendError>) {
        self.lock().responses.push_back(response);
    }

    /// Simulate the broker assigning a new identity outside of any fetch.
    pub fn notify_identity_changed(&self, identity: impl Into<String>) {
        self.lock().assign(&identity.into());
    }

    /// Identity id the broker currently associates with the credentials.
    pub fn cached_identity(&self) -> String {
        self.lock().cached_identity.clone()
    }

    /// Providers with a registered access token.
    pub fn login_providers(&self) -> Vec<String> {
        self.lock().logins.keys().cloned().collect()
    }

    /// The access token registered for a provider.
    pub fn access_token(&self, provider: &str) -> Option<String> {
        self.lock()
            .logins
            .get(provider)
            .map(|token| token.expose_secret().to_string())
    }

    /// Pool ids of all credentials constructed so far.
    pub fn connected_pools(&self) -> Vec<String> {
        self.lock().connected_pools.clone()
    }

    /// Number of identity fetches made so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityBackend for MockBackend {
    async fn connect(&self, config: &IdentityConfig) -> Result<Box<dyn FederatedIdentity>, BackendError> {
        let mut state = self.lock();

        if let Some(error) = state.connect_error.clone() {
            return Err(error);
        }

        state.connected_pools.push(config.pool_id.clone());

        Ok(Box::new(MockIdentity {
            backend: self.clone(),
        }))
    }
}

struct MockIdentity {
    backend: MockBackend,
}

#[async_trait]
impl FederatedIdentity for MockIdentity {
    fn cached_identity_id(&self) -> Result<String, BackendError> {
        let state = self.backend.lock();

        match &state.cached_identity_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.cached_identity.clone()),
        }
    }

    fn add_login(&mut self, provider: &str, access_token: SecretString) {
        self.backend.lock().logins.insert(provider.to_string(), access_token);
    }

    fn login_providers(&self) -> Vec<String> {
        self.backend.login_providers()
    }

    fn on_identity_changed(&mut self, listener: IdentityListener) {
        self.backend.lock().listener = Some(listener);
    }

    async fn identity_id(&mut self) -> Result<String, BackendError> {
        let mut state = self.backend.lock();
        state.requests += 1;

        let response = state
            .responses
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Internal("no scripted response left".to_string())))?;

        state.assign(&response);

        Ok(response)
    }

    fn clear(&mut self) {
        let mut state = self.backend.lock();

        state.cached_identity.clear();
        state.logins.clear();
    }
}
