use agora_core::{AppResult, UserIdentity};
use agora_domain::EmailAddress;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session issued by the hosted identity service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token sent with backend requests.
    pub access_token: String,
    /// Token exchanged for a fresh session once the access token expires.
    pub refresh_token: String,
    /// Access token expiry.
    pub expires_at: DateTime<Utc>,
    /// Signed-in user.
    pub user: UserIdentity,
}

impl AuthSession {
    /// Returns whether the access token expires before `now + margin`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Port for the hosted identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> AppResult<AuthSession>;

    /// Exchanges a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> AppResult<AuthSession>;

    /// Revokes the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;

    /// Asks the service to email a password reset link pointing at `redirect_url`.
    async fn request_password_reset(
        &self,
        email: &EmailAddress,
        redirect_url: &str,
    ) -> AppResult<()>;
}

/// Port for small on-device key/value state.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Loads the persisted session, if any.
    async fn load_session(&self) -> AppResult<Option<AuthSession>>;

    /// Persists the session, replacing any previous one.
    async fn save_session(&self, session: &AuthSession) -> AppResult<()>;

    /// Removes the persisted session.
    async fn clear_session(&self) -> AppResult<()>;

    /// Returns whether the onboarding flow was completed on this device.
    async fn onboarding_completed(&self) -> AppResult<bool>;

    /// Records that the onboarding flow was completed.
    async fn mark_onboarding_completed(&self) -> AppResult<()>;
}
