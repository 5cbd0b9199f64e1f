//! Session context for the signed-in user.
//!
//! Created once by the composition root and handed to whatever needs the
//! current session. `restore` is the startup step and `sign_out` the
//! teardown; consumers observe changes through [`AuthSessionService::subscribe`].

use std::sync::Arc;

use agora_core::AppResult;
use agora_domain::{EmailAddress, validate_sign_in_password};
use chrono::{Duration, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{AuthSession, DeviceStore, IdentityProvider};

mod launch;
mod password_reset;

pub use launch::LaunchRoute;

/// Sessions closer than this to expiry are refreshed during restore.
const SESSION_REFRESH_MARGIN_SECONDS: i64 = 60;

/// Application service owning the current authentication session.
#[derive(Clone)]
pub struct AuthSessionService {
    identity_provider: Arc<dyn IdentityProvider>,
    device_store: Arc<dyn DeviceStore>,
    password_reset_redirect: String,
    session: Arc<watch::Sender<Option<AuthSession>>>,
}

impl AuthSessionService {
    /// Creates a signed-out session context.
    #[must_use]
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        device_store: Arc<dyn DeviceStore>,
        password_reset_redirect: String,
    ) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            identity_provider,
            device_store,
            password_reset_redirect,
            session: Arc::new(session),
        }
    }

    /// Returns the current session, if signed in.
    #[must_use]
    pub fn current_session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    /// Returns a receiver notified whenever the session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    /// Restores the persisted session, refreshing it when it is about to expire.
    ///
    /// Storage and refresh failures end in the signed-out state.
    pub async fn restore(&self) -> Option<AuthSession> {
        let stored = match self.device_store.load_session().await {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, "failed to load stored session");
                None
            }
        };

        let Some(stored) = stored else {
            self.publish(None);
            return None;
        };

        let margin = Duration::seconds(SESSION_REFRESH_MARGIN_SECONDS);
        if !stored.expires_within(Utc::now(), margin) {
            info!(subject = %stored.user.subject(), "restored stored session");
            self.publish(Some(stored.clone()));
            return Some(stored);
        }

        match self
            .identity_provider
            .refresh_session(stored.refresh_token.as_str())
            .await
        {
            Ok(refreshed) => {
                if let Err(error) = self.device_store.save_session(&refreshed).await {
                    warn!(error = %error, "failed to persist refreshed session");
                }
                info!(subject = %refreshed.user.subject(), "refreshed stored session");
                self.publish(Some(refreshed.clone()));
                Some(refreshed)
            }
            Err(error) => {
                warn!(
                    subject = %stored.user.subject(),
                    error = %error,
                    "stored session could not be refreshed, signing out"
                );
                if let Err(error) = self.device_store.clear_session().await {
                    warn!(error = %error, "failed to clear stored session");
                }
                self.publish(None);
                None
            }
        }
    }

    /// Signs in with email and password and persists the new session.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let email = EmailAddress::new(email)?;
        validate_sign_in_password(password)?;

        let session = self
            .identity_provider
            .sign_in_with_password(&email, password)
            .await?;
        self.device_store.save_session(&session).await?;

        info!(subject = %session.user.subject(), "signed in");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    /// Signs out. The local session is always dropped, even when the
    /// identity service cannot be reached.
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(session) = self.current_session()
            && let Err(error) = self
                .identity_provider
                .sign_out(session.access_token.as_str())
                .await
        {
            warn!(
                subject = %session.user.subject(),
                error = %error,
                "remote sign-out failed, dropping local session anyway"
            );
        }

        self.publish(None);
        self.device_store.clear_session().await?;
        info!("signed out");
        Ok(())
    }

    fn publish(&self, session: Option<AuthSession>) {
        self.session.send_replace(session);
    }
}
