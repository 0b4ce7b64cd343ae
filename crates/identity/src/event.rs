/// Notification that the broker assigned a different identity id.
///
/// Fired by credentials whenever a backend call changes the identity, for example
/// when an anonymous identity gets merged into an authenticated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChangedEvent {
    /// The identity id before the change, empty if none was assigned yet.
    pub old_identity: String,
    /// The newly assigned identity id.
    pub new_identity: String,
}

impl IdentityChangedEvent {
    pub fn new(old_identity: impl Into<String>, new_identity: impl Into<String>) -> Self {
        Self {
            old_identity: old_identity.into(),
            new_identity: new_identity.into(),
        }
    }
}

/// Listener invoked synchronously, from inside the backend call that caused the change.
pub type IdentityListener = Box<dyn Fn(&IdentityChangedEvent) + Send + Sync>;
