use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User information carried by an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: Uuid,
    display_name: String,
    email: Option<String>,
}

impl UserIdentity {
    /// Creates a user identity from the identity provider's user record.
    #[must_use]
    pub fn new(subject: Uuid, display_name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            subject,
            display_name: display_name.into(),
            email,
        }
    }

    /// Returns the stable subject identifier issued by the identity provider.
    #[must_use]
    pub fn subject(&self) -> Uuid {
        self.subject
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
