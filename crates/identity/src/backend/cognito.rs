//! Amazon Cognito Identity backend.
//!
//! Identity ids are obtained with the unauthenticated `GetId` and `GetOpenIdToken`
//! operations, so the SDK client is built without signing credentials. The identity
//! id is cached in memory only.

use std::{
    collections::{BTreeMap, HashMap},
    sync::OnceLock,
};

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_cognitoidentity::{Client as CognitoIdentityClient, error::ProvideErrorMetadata};
use aws_smithy_runtime_api::client::result::SdkError;
use config::IdentityConfig;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    backend::{FederatedIdentity, IdentityBackend},
    error::BackendError,
    event::{IdentityChangedEvent, IdentityListener},
};

static REGION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn is_valid_region(region: &str) -> bool {
    REGION_PATTERN
        .get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("region pattern is a valid regex"))
        .is_match(region)
}

/// Backend talking to the Cognito Identity service of the configured region.
#[derive(Debug, Default, Clone)]
pub struct CognitoBackend;

impl CognitoBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityBackend for CognitoBackend {
    async fn connect(&self, config: &IdentityConfig) -> Result<Box<dyn FederatedIdentity>, BackendError> {
        if !is_valid_region(&config.region) {
            return Err(BackendError::InvalidRegion(config.region.clone()));
        }

        if let Some(pool_region) = config.mismatched_pool_region() {
            log::warn!(
                "Identity pool '{}' belongs to region '{pool_region}', requests go to '{}'",
                config.pool_id,
                config.region
            );
        }

        let sdk_config = create_aws_config(config).await;
        let client = CognitoIdentityClient::new(&sdk_config);

        log::debug!("Created Cognito Identity client for pool '{}'", config.pool_id);

        Ok(Box::new(CognitoIdentity::new(client, config.pool_id.clone())))
    }
}

async fn create_aws_config(config: &IdentityConfig) -> aws_config::SdkConfig {
    let mut aws_config_builder = aws_config::from_env()
        .region(Region::new(config.region.clone()))
        .no_credentials();

    // Set custom endpoint for testing/development if provided
    if let Some(endpoint_url) = &config.endpoint_url {
        log::debug!("Using custom Cognito Identity endpoint: {endpoint_url}");
        aws_config_builder = aws_config_builder.endpoint_url(endpoint_url.as_str());
    }

    aws_config_builder.load().await
}

/// Credentials of one end-user in a Cognito identity pool.
struct CognitoIdentity {
    client: CognitoIdentityClient,
    pool_id: String,
    identity_id: Option<String>,
    logins: BTreeMap<String, SecretString>,
    listener: Option<IdentityListener>,
}

impl CognitoIdentity {
    fn new(client: CognitoIdentityClient, pool_id: String) -> Self {
        Self {
            client,
            pool_id,
            identity_id: None,
            logins: BTreeMap::new(),
            listener: None,
        }
    }

    fn exposed_logins(&self) -> Option<HashMap<String, String>> {
        if self.logins.is_empty() {
            return None;
        }

        let logins = self
            .logins
            .iter()
            .map(|(provider, token)| (provider.clone(), token.expose_secret().to_string()))
            .collect();

        Some(logins)
    }

    async fn get_id(&self, logins: Option<HashMap<String, String>>) -> Result<Option<String>, BackendError> {
        let output = self
            .client
            .get_id()
            .identity_pool_id(&self.pool_id)
            .set_logins(logins)
            .send()
            .await?;

        Ok(output.identity_id().map(ToOwned::to_owned))
    }

    async fn get_open_id_token(
        &self,
        identity_id: &str,
        logins: HashMap<String, String>,
    ) -> Result<Option<String>, BackendError> {
        let output = self
            .client
            .get_open_id_token()
            .identity_id(identity_id)
            .set_logins(Some(logins))
            .send()
            .await?;

        Ok(output.identity_id().map(ToOwned::to_owned))
    }

    fn update_identity(&mut self, identity_id: &str) {
        if self.identity_id.as_deref() == Some(identity_id) {
            return;
        }

        let old = self.identity_id.replace(identity_id.to_string()).unwrap_or_default();

        if let Some(listener) = &self.listener {
            listener(&IdentityChangedEvent::new(old, identity_id));
        }
    }
}

#[async_trait]
impl FederatedIdentity for CognitoIdentity {
    fn cached_identity_id(&self) -> Result<String, BackendError> {
        Ok(self.identity_id.clone().unwrap_or_default())
    }

    fn add_login(&mut self, provider: &str, access_token: SecretString) {
        self.logins.insert(provider.to_string(), access_token);
    }

    fn login_providers(&self) -> Vec<String> {
        self.logins.keys().cloned().collect()
    }

    fn on_identity_changed(&mut self, listener: IdentityListener) {
        self.listener = Some(listener);
    }

    async fn identity_id(&mut self) -> Result<String, BackendError> {
        let logins = self.exposed_logins();

        let fetched = match (self.identity_id.clone(), logins) {
            (Some(identity_id), None) => return Ok(identity_id),
            (None, logins) => self.get_id(logins).await?,
            // Presenting logins for a known identity may merge it into an authenticated one.
            (Some(identity_id), Some(logins)) => self.get_open_id_token(&identity_id, logins).await?,
        };

        let identity_id = fetched
            .ok_or_else(|| BackendError::Internal("Cognito response did not contain an identity id".to_string()))?;

        log::debug!("Cognito assigned identity '{identity_id}' in pool '{}'", self.pool_id);

        self.update_identity(&identity_id);

        Ok(identity_id)
    }

    fn clear(&mut self) {
        self.identity_id = None;
        self.logins.clear();
    }
}

/// Convert AWS SDK errors to BackendError.
///
/// Service errors are mapped by the error code returned by Cognito.
impl<E, R> From<SdkError<E, R>> for BackendError
where
    E: ProvideErrorMetadata + std::fmt::Display + std::fmt::Debug,
    R: std::fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        log::debug!("Cognito Identity error details: {err:?}");

        match &err {
            SdkError::ServiceError(service_err) => {
                let message = service_err
                    .err()
                    .message()
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| service_err.err().to_string());

                error_from_code(service_err.err().code(), message)
            }
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => BackendError::Connection(err.to_string()),
            _ => BackendError::Internal(err.to_string()),
        }
    }
}

fn error_from_code(code: Option<&str>, message: String) -> BackendError {
    match code {
        Some("NotAuthorizedException") | Some("ExternalServiceException") => BackendError::NotAuthorized(message),
        Some("ResourceNotFoundException") => BackendError::ResourceNotFound(message),
        Some("TooManyRequestsException") | Some("LimitExceededException") => BackendError::Throttled(message),
        Some("InvalidParameterException") => BackendError::InvalidParameter(message),
        _ => BackendError::Service(message),
    }
}
