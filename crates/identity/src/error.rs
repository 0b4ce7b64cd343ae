use thiserror::Error;

/// Errors surfaced by [`IdentityClient`](crate::IdentityClient).
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The configuration cannot be used to build credentials.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Building the credentials or reading the cached identity failed.
    #[error("Failed to initialize credentials: {0}")]
    Initialization(#[source] BackendError),

    /// Fetching the identity from the broker failed.
    #[error("Failed to refresh identity: {0}")]
    Refresh(#[source] BackendError),

    /// An operation needing credentials ran before a successful initialization.
    #[error("Identity client is not initialized")]
    NotInitialized,
}

/// Errors reported by an identity-brokering backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The region name is not a valid AWS region.
    #[error("Invalid region '{0}'")]
    InvalidRegion(String),

    /// The broker rejected the logins or the pool does not allow the access.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// The identity pool or identity does not exist.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Request rate or pool limits exceeded.
    #[error("Throttled: {0}")]
    Throttled(String),

    /// The broker rejected a request parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error returned by the service.
    #[error("Service error: {0}")]
    Service(String),

    /// Network, timeout or dispatch failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend answered in a way that cannot be used.
    #[error("Internal error: {0}")]
    Internal(String),
}
