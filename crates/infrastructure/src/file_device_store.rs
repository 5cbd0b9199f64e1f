use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use agora_application::{AuthSession, DeviceStore};
use agora_core::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Device state persisted as one JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DeviceState {
    #[serde(default)]
    session: Option<AuthSession>,
    #[serde(default)]
    onboarding_completed: bool,
}

/// JSON file device store. A missing file reads as empty state.
pub struct FileDeviceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDeviceStore {
    /// Creates a store backed by `path`. Parent directories are created on
    /// first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    async fn read_state(&self) -> AppResult<DeviceState> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(DeviceState::default());
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read device store '{}': {error}",
                    self.path.display()
                )));
            }
        };

        serde_json::from_str(contents.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode device store '{}': {error}",
                self.path.display()
            ))
        })
    }

    async fn update_state<F>(&self, update: F) -> AppResult<()>
    where
        F: FnOnce(&mut DeviceState) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut state = self.read_state().await?;
        update(&mut state);

        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create device store directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let encoded = serde_json::to_vec_pretty(&state).map_err(|error| {
            AppError::Internal(format!("failed to encode device store: {error}"))
        })?;

        let staging_path = self.path.with_extension("tmp");
        tokio::fs::write(&staging_path, encoded)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write device store '{}': {error}",
                    staging_path.display()
                ))
            })?;
        tokio::fs::rename(&staging_path, &self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace device store '{}': {error}",
                    self.path.display()
                ))
            })
    }
}

#[async_trait]
impl DeviceStore for FileDeviceStore {
    async fn load_session(&self) -> AppResult<Option<AuthSession>> {
        Ok(self.read_state().await?.session)
    }

    async fn save_session(&self, session: &AuthSession) -> AppResult<()> {
        let session = session.clone();
        self.update_state(move |state| state.session = Some(session))
            .await
    }

    async fn clear_session(&self) -> AppResult<()> {
        self.update_state(|state| state.session = None).await
    }

    async fn onboarding_completed(&self) -> AppResult<bool> {
        Ok(self.read_state().await?.onboarding_completed)
    }

    async fn mark_onboarding_completed(&self) -> AppResult<()> {
        self.update_state(|state| state.onboarding_completed = true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use agora_application::{AuthSession, DeviceStore};
    use agora_core::UserIdentity;
    use chrono::Utc;

    use super::FileDeviceStore;

    fn scratch_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("agora-device-store-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty_state() {
        let store = FileDeviceStore::new(scratch_dir().join("device.json"));

        assert_eq!(store.load_session().await.ok(), Some(None));
        assert_eq!(store.onboarding_completed().await.ok(), Some(false));
    }

    #[tokio::test]
    async fn session_and_onboarding_flag_survive_reopen() {
        let directory = scratch_dir();
        let path = directory.join("nested").join("device.json");
        let session = AuthSession {
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            expires_at: Utc::now(),
            user: UserIdentity::new(uuid::Uuid::new_v4(), "Jo", None),
        };

        let store = FileDeviceStore::new(path.clone());
        assert!(store.save_session(&session).await.is_ok());
        assert!(store.mark_onboarding_completed().await.is_ok());

        let reopened = FileDeviceStore::new(path);
        assert_eq!(reopened.load_session().await.ok(), Some(Some(session)));
        assert_eq!(reopened.onboarding_completed().await.ok(), Some(true));

        assert!(reopened.clear_session().await.is_ok());
        assert_eq!(reopened.load_session().await.ok(), Some(None));
        assert_eq!(reopened.onboarding_completed().await.ok(), Some(true));

        let _ = tokio::fs::remove_dir_all(directory).await;
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let directory = scratch_dir();
        let path = directory.join("device.json");
        assert!(tokio::fs::create_dir_all(&directory).await.is_ok());
        assert!(tokio::fs::write(&path, "not json").await.is_ok());

        let store = FileDeviceStore::new(path);
        assert!(store.load_session().await.is_err());

        let _ = tokio::fs::remove_dir_all(directory).await;
    }
}
