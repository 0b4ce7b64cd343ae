//! Federated identity acquisition.
//!
//! [`IdentityClient`] wraps the credentials of one identity pool: it initializes them
//! anonymously or with a social login access token, fetches the identity id assigned
//! by the broker, follows identity change notifications and clears everything on
//! request. The broker itself sits behind [`IdentityBackend`], implemented for Amazon
//! Cognito Identity by [`CognitoBackend`].

mod backend;
mod client;
mod error;
mod event;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use backend::{CognitoBackend, FederatedIdentity, IdentityBackend};
pub use client::{IdentityClient, ProviderLogin};
pub use error::{BackendError, IdentityError};
pub use event::{IdentityChangedEvent, IdentityListener};

pub(crate) type Result<T> = std::result::Result<T, IdentityError>;
