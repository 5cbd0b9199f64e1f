use tracing::warn;

use super::*;

/// First screen group shown when the app starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchRoute {
    /// First run on this device.
    Onboarding,
    /// Onboarding done but nobody is signed in.
    Login,
    /// A session is present.
    Authenticated,
}

impl LaunchRoute {
    /// Returns a stable name for logs and diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Login => "login",
            Self::Authenticated => "authenticated",
        }
    }
}

impl AuthSessionService {
    /// Picks the screen group to show from the current session and the
    /// onboarding flag.
    pub async fn launch_route(&self) -> LaunchRoute {
        if self.current_session().is_some() {
            return LaunchRoute::Authenticated;
        }

        match self.device_store.onboarding_completed().await {
            Ok(true) => LaunchRoute::Login,
            Ok(false) => LaunchRoute::Onboarding,
            Err(error) => {
                warn!(error = %error, "failed to read onboarding flag");
                LaunchRoute::Onboarding
            }
        }
    }

    /// Records that onboarding was completed on this device.
    pub async fn complete_onboarding(&self) -> AppResult<()> {
        self.device_store.mark_onboarding_completed().await
    }
}
