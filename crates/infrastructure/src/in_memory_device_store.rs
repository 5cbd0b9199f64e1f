use agora_application::{AuthSession, DeviceStore};
use agora_core::AppResult;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory device store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryDeviceStore {
    session: RwLock<Option<AuthSession>>,
    onboarding_completed: RwLock<bool>,
}

impl InMemoryDeviceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn load_session(&self) -> AppResult<Option<AuthSession>> {
        Ok(self.session.read().await.clone())
    }

    async fn save_session(&self, session: &AuthSession) -> AppResult<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear_session(&self) -> AppResult<()> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn onboarding_completed(&self) -> AppResult<bool> {
        Ok(*self.onboarding_completed.read().await)
    }

    async fn mark_onboarding_completed(&self) -> AppResult<()> {
        *self.onboarding_completed.write().await = true;
        Ok(())
    }
}
