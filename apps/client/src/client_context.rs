use std::sync::Arc;
use std::time::Duration;

use agora_application::{
    AuthSession, AuthSessionService, DeviceStore, MembershipRoleRepository, PermissionResolver,
};
use agora_core::{AppError, AppResult};
use agora_infrastructure::{
    FileDeviceStore, HostedBackend, HttpIdentityProvider, InMemoryDeviceStore,
    InMemoryMembershipRoleRepository, PostgresMembershipRoleRepository,
    PostgrestMembershipRoleRepository,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::client_config::{ClientConfig, DeviceStoreConfig, MembershipStoreConfig};

/// Services shared by every screen, built once at startup.
#[derive(Clone)]
pub struct ClientContext {
    pub auth: AuthSessionService,
    pub permissions: PermissionResolver,
}

pub async fn build_client_context(config: &ClientConfig) -> AppResult<ClientContext> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let backend = HostedBackend::new(
        http_client,
        config.backend_url.as_str(),
        config.anon_key.as_str(),
    )?;

    let device_store: Arc<dyn DeviceStore> = match &config.device_store {
        DeviceStoreConfig::File(path) => Arc::new(FileDeviceStore::new(path.clone())),
        DeviceStoreConfig::Memory => Arc::new(InMemoryDeviceStore::new()),
    };

    let auth = AuthSessionService::new(
        Arc::new(HttpIdentityProvider::new(backend.clone())),
        device_store,
        config.password_reset_redirect.clone(),
    );

    let membership_repository: Arc<dyn MembershipRoleRepository> =
        match &config.membership_store {
            MembershipStoreConfig::Rest { table } => Arc::new(
                PostgrestMembershipRoleRepository::new(backend, table.as_str())?
                    .with_session_updates(auth.subscribe()),
            ),
            MembershipStoreConfig::Postgres { database_url } => {
                let pool = PgPoolOptions::new()
                    .max_connections(2)
                    .connect(database_url)
                    .await
                    .map_err(|error| {
                        AppError::Internal(format!("failed to connect to database: {error}"))
                    })?;
                Arc::new(PostgresMembershipRoleRepository::new(pool))
            }
            MembershipStoreConfig::Memory { seed } => {
                let repository = InMemoryMembershipRoleRepository::new();
                for entry in seed {
                    repository
                        .put_raw(entry.association_id, entry.subject, entry.role.as_str())
                        .await;
                }
                info!(memberships = seed.len(), "seeded in-memory membership store");
                Arc::new(repository)
            }
        };

    let permissions = PermissionResolver::new(membership_repository);
    spawn_sign_out_teardown(auth.subscribe(), permissions.clone());

    Ok(ClientContext { auth, permissions })
}

/// Drops resolved permissions whenever the session goes away.
fn spawn_sign_out_teardown(
    mut session: watch::Receiver<Option<AuthSession>>,
    permissions: PermissionResolver,
) {
    tokio::spawn(async move {
        while session.changed().await.is_ok() {
            if session.borrow_and_update().is_none() {
                debug!("session ended, clearing resolved permissions");
                permissions.clear();
            }
        }
    });
}
