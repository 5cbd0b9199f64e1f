use std::collections::HashMap;
use std::sync::Arc;

use agora_core::{AppError, AppResult, AssociationId};
use agora_domain::{AssociationRole, UserId};
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};

use super::{PermissionResolver, ResolutionStatus};
use crate::MembershipRoleRepository;

#[derive(Default)]
struct FakeMembershipRoleRepository {
    roles: HashMap<(AssociationId, UserId), String>,
    fail: bool,
    calls: Mutex<Vec<(AssociationId, UserId)>>,
}

impl FakeMembershipRoleRepository {
    fn with_role(association_id: AssociationId, subject: UserId, role: &str) -> Self {
        Self {
            roles: HashMap::from([((association_id, subject), role.to_owned())]),
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MembershipRoleRepository for FakeMembershipRoleRepository {
    async fn find_role(
        &self,
        association_id: AssociationId,
        subject: UserId,
    ) -> AppResult<Option<String>> {
        self.calls.lock().await.push((association_id, subject));

        if self.fail {
            return Err(AppError::Internal("membership store unavailable".to_owned()));
        }

        Ok(self.roles.get(&(association_id, subject)).cloned())
    }
}

type PendingLookup = oneshot::Receiver<AppResult<Option<String>>>;

/// Holds every lookup until the test releases it.
struct GatedMembershipRoleRepository {
    started: mpsc::UnboundedSender<UserId>,
    pending: Mutex<HashMap<UserId, Vec<PendingLookup>>>,
}

impl GatedMembershipRoleRepository {
    fn new(started: mpsc::UnboundedSender<UserId>) -> Self {
        Self {
            started,
            pending: Mutex::new(HashMap::new()),
        }
    }

    async fn gate(&self, subject: UserId) -> oneshot::Sender<AppResult<Option<String>>> {
        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .await
            .entry(subject)
            .or_default()
            .push(receiver);
        sender
    }
}

#[async_trait]
impl MembershipRoleRepository for GatedMembershipRoleRepository {
    async fn find_role(
        &self,
        _association_id: AssociationId,
        subject: UserId,
    ) -> AppResult<Option<String>> {
        let receiver = {
            let mut pending = self.pending.lock().await;
            pending
                .get_mut(&subject)
                .filter(|queue| !queue.is_empty())
                .map(|queue| queue.remove(0))
        };
        let _ = self.started.send(subject);

        match receiver {
            Some(receiver) => receiver.await.unwrap_or_else(|_| {
                Err(AppError::Internal("lookup gate dropped".to_owned()))
            }),
            None => Err(AppError::Internal("no lookup gate registered".to_owned())),
        }
    }
}

#[tokio::test]
async fn missing_subject_yields_no_role_without_lookup() {
    let repository = Arc::new(FakeMembershipRoleRepository::default());
    let resolver = PermissionResolver::new(repository.clone());

    let snapshot = resolver.resolve(None, Some(AssociationId::new())).await;

    assert_eq!(snapshot.role(), AssociationRole::None);
    assert!(!snapshot.is_loading());
    assert_eq!(snapshot.status(), ResolutionStatus::Idle);
    assert!(repository.calls.lock().await.is_empty());
}

#[tokio::test]
async fn missing_association_yields_no_role_without_lookup() {
    let repository = Arc::new(FakeMembershipRoleRepository::default());
    let resolver = PermissionResolver::new(repository.clone());

    let snapshot = resolver.resolve(Some(UserId::new()), None).await;

    assert_eq!(snapshot.role(), AssociationRole::None);
    assert!(!snapshot.is_loading());
    assert!(repository.calls.lock().await.is_empty());
}

#[tokio::test]
async fn empty_result_yields_no_role() {
    let repository = Arc::new(FakeMembershipRoleRepository::default());
    let resolver = PermissionResolver::new(repository.clone());

    let snapshot = resolver
        .resolve(Some(UserId::new()), Some(AssociationId::new()))
        .await;

    assert_eq!(snapshot.role(), AssociationRole::None);
    assert_eq!(snapshot.status(), ResolutionStatus::Resolved);
    assert!(!snapshot.lookup_failed());
    assert_eq!(repository.calls.lock().await.len(), 1);
}

#[tokio::test]
async fn admin_row_yields_admin_capabilities() {
    let association_id = AssociationId::new();
    let subject = UserId::new();
    let resolver = PermissionResolver::new(Arc::new(FakeMembershipRoleRepository::with_role(
        association_id,
        subject,
        "admin",
    )));

    let snapshot = resolver.resolve(Some(subject), Some(association_id)).await;
    let capabilities = snapshot.capabilities();

    assert_eq!(snapshot.role(), AssociationRole::Admin);
    assert!(!snapshot.is_loading());
    assert!(capabilities.create_post());
    assert!(capabilities.delete_post());
    assert!(!capabilities.manage_admins());
    assert!(!capabilities.delete_association());
}

#[tokio::test]
async fn unrecognised_role_yields_no_role() {
    let association_id = AssociationId::new();
    let subject = UserId::new();
    let resolver = PermissionResolver::new(Arc::new(FakeMembershipRoleRepository::with_role(
        association_id,
        subject,
        "superadmin",
    )));

    let snapshot = resolver.resolve(Some(subject), Some(association_id)).await;

    assert_eq!(snapshot.role(), AssociationRole::None);
    assert!(snapshot.capabilities().granted().is_empty());
}

#[tokio::test]
async fn lookup_failure_degrades_to_no_role() {
    let resolver = PermissionResolver::new(Arc::new(FakeMembershipRoleRepository::failing()));

    let snapshot = resolver
        .resolve(Some(UserId::new()), Some(AssociationId::new()))
        .await;

    assert_eq!(snapshot.role(), AssociationRole::None);
    assert!(snapshot.lookup_failed());
    assert!(!snapshot.is_loading());
}

#[tokio::test]
async fn same_pair_does_not_refetch_until_refresh() {
    let association_id = AssociationId::new();
    let subject = UserId::new();
    let repository = Arc::new(FakeMembershipRoleRepository::with_role(
        association_id,
        subject,
        "editor",
    ));
    let resolver = PermissionResolver::new(repository.clone());

    resolver.resolve(Some(subject), Some(association_id)).await;
    resolver.resolve(Some(subject), Some(association_id)).await;
    assert_eq!(repository.calls.lock().await.len(), 1);

    let snapshot = resolver.refresh().await;
    assert_eq!(snapshot.role(), AssociationRole::Editor);
    assert_eq!(repository.calls.lock().await.len(), 2);
}

#[tokio::test]
async fn refresh_without_pair_is_idle() {
    let repository = Arc::new(FakeMembershipRoleRepository::default());
    let resolver = PermissionResolver::new(repository.clone());

    let snapshot = resolver.refresh().await;

    assert_eq!(snapshot.status(), ResolutionStatus::Idle);
    assert!(repository.calls.lock().await.is_empty());
}

#[tokio::test]
async fn stale_result_does_not_overwrite_newer_pair() {
    let association_id = AssociationId::new();
    let first_subject = UserId::new();
    let second_subject = UserId::new();
    let (started_sender, mut started) = mpsc::unbounded_channel();
    let repository = Arc::new(GatedMembershipRoleRepository::new(started_sender));
    let release_first = repository.gate(first_subject).await;
    let release_second = repository.gate(second_subject).await;
    let resolver = PermissionResolver::new(repository);

    let first = tokio::spawn({
        let resolver = resolver.clone();
        async move {
            resolver
                .resolve(Some(first_subject), Some(association_id))
                .await
        }
    });
    assert_eq!(started.recv().await, Some(first_subject));

    let second = tokio::spawn({
        let resolver = resolver.clone();
        async move {
            resolver
                .resolve(Some(second_subject), Some(association_id))
                .await
        }
    });
    assert_eq!(started.recv().await, Some(second_subject));

    let _ = release_second.send(Ok(Some("editor".to_owned())));
    let second_snapshot = second.await.ok();
    assert_eq!(
        second_snapshot.map(|snapshot| snapshot.role()),
        Some(AssociationRole::Editor)
    );

    let _ = release_first.send(Ok(Some("president".to_owned())));
    let _ = first.await;

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.role(), AssociationRole::Editor);
    assert_eq!(
        snapshot.request().map(|request| request.subject()),
        Some(second_subject)
    );
    assert!(!snapshot.is_loading());
}

#[tokio::test]
async fn pair_change_hides_previous_role_while_loading() {
    let association_id = AssociationId::new();
    let other_association_id = AssociationId::new();
    let subject = UserId::new();
    let (started_sender, mut started) = mpsc::unbounded_channel();
    let repository = Arc::new(GatedMembershipRoleRepository::new(started_sender));
    let release_first = repository.gate(subject).await;
    let release_second = repository.gate(subject).await;
    let resolver = PermissionResolver::new(repository);

    let _ = release_first.send(Ok(Some("president".to_owned())));
    let snapshot = resolver.resolve(Some(subject), Some(association_id)).await;
    assert_eq!(snapshot.role(), AssociationRole::President);
    assert_eq!(started.recv().await, Some(subject));

    let pending = tokio::spawn({
        let resolver = resolver.clone();
        async move {
            resolver
                .resolve(Some(subject), Some(other_association_id))
                .await
        }
    });
    assert_eq!(started.recv().await, Some(subject));

    let loading = resolver.snapshot();
    assert!(loading.is_loading());
    assert_eq!(loading.role(), AssociationRole::None);

    let _ = release_second.send(Ok(None));
    let _ = pending.await;
    assert_eq!(resolver.snapshot().status(), ResolutionStatus::Resolved);
}

#[tokio::test]
async fn refresh_keeps_previous_role_while_loading() {
    let association_id = AssociationId::new();
    let subject = UserId::new();
    let (started_sender, mut started) = mpsc::unbounded_channel();
    let repository = Arc::new(GatedMembershipRoleRepository::new(started_sender));
    let release_first = repository.gate(subject).await;
    let release_refresh = repository.gate(subject).await;
    let resolver = PermissionResolver::new(repository);

    let _ = release_first.send(Ok(Some("admin".to_owned())));
    resolver.resolve(Some(subject), Some(association_id)).await;
    assert_eq!(started.recv().await, Some(subject));

    let pending = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.refresh().await }
    });
    assert_eq!(started.recv().await, Some(subject));

    let loading = resolver.snapshot();
    assert!(loading.is_loading());
    assert_eq!(loading.role(), AssociationRole::Admin);

    let _ = release_refresh.send(Ok(Some("editor".to_owned())));
    let refreshed = pending.await.ok();
    assert_eq!(
        refreshed.map(|snapshot| snapshot.role()),
        Some(AssociationRole::Editor)
    );
}

#[tokio::test]
async fn clear_discards_in_flight_lookup() {
    let association_id = AssociationId::new();
    let subject = UserId::new();
    let (started_sender, mut started) = mpsc::unbounded_channel();
    let repository = Arc::new(GatedMembershipRoleRepository::new(started_sender));
    let release = repository.gate(subject).await;
    let resolver = PermissionResolver::new(repository);

    let pending = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(Some(subject), Some(association_id)).await }
    });
    assert_eq!(started.recv().await, Some(subject));

    resolver.clear();
    let _ = release.send(Ok(Some("president".to_owned())));
    let _ = pending.await;

    let snapshot = resolver.snapshot();
    assert_eq!(snapshot.role(), AssociationRole::None);
    assert_eq!(snapshot.status(), ResolutionStatus::Idle);
    assert!(snapshot.request().is_none());
}

#[tokio::test]
async fn subscribers_observe_resolved_state() {
    let association_id = AssociationId::new();
    let subject = UserId::new();
    let resolver = PermissionResolver::new(Arc::new(FakeMembershipRoleRepository::with_role(
        association_id,
        subject,
        "president",
    )));
    let mut updates = resolver.subscribe();

    resolver.resolve(Some(subject), Some(association_id)).await;

    assert!(updates.has_changed().unwrap_or(false));
    let observed = updates.borrow_and_update().clone();
    assert_eq!(observed.role(), AssociationRole::President);
    assert!(observed.capabilities().delete_association());
}
