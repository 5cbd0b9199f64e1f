use std::collections::HashMap;

use agora_application::MembershipRoleRepository;
use agora_core::{AppResult, AssociationId};
use agora_domain::{AssociationRole, UserId};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory membership store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryMembershipRoleRepository {
    roles: RwLock<HashMap<(AssociationId, UserId), String>>,
}

impl InMemoryMembershipRoleRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw role value, as an external admin tool would.
    pub async fn put_raw(&self, association_id: AssociationId, subject: UserId, role: &str) {
        self.roles
            .write()
            .await
            .insert((association_id, subject), role.to_owned());
    }

    /// Assigns a role; assigning [`AssociationRole::None`] removes the row.
    pub async fn assign(
        &self,
        association_id: AssociationId,
        subject: UserId,
        role: AssociationRole,
    ) {
        match role.storage_value() {
            Some(value) => self.put_raw(association_id, subject, value).await,
            None => {
                self.roles.write().await.remove(&(association_id, subject));
            }
        }
    }
}

#[async_trait]
impl MembershipRoleRepository for InMemoryMembershipRoleRepository {
    async fn find_role(
        &self,
        association_id: AssociationId,
        subject: UserId,
    ) -> AppResult<Option<String>> {
        Ok(self
            .roles
            .read()
            .await
            .get(&(association_id, subject))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use agora_application::MembershipRoleRepository;
    use agora_core::AssociationId;
    use agora_domain::{AssociationRole, UserId};

    use super::InMemoryMembershipRoleRepository;

    #[tokio::test]
    async fn assign_and_revoke_roles() {
        let repository = InMemoryMembershipRoleRepository::new();
        let association_id = AssociationId::new();
        let subject = UserId::new();

        repository
            .assign(association_id, subject, AssociationRole::Editor)
            .await;
        let stored = repository.find_role(association_id, subject).await;
        assert_eq!(stored.ok().flatten().as_deref(), Some("editor"));

        repository
            .assign(association_id, subject, AssociationRole::None)
            .await;
        let stored = repository.find_role(association_id, subject).await;
        assert_eq!(stored.ok().flatten(), None);
    }

    #[tokio::test]
    async fn rows_are_scoped_to_the_association() {
        let repository = InMemoryMembershipRoleRepository::new();
        let subject = UserId::new();
        repository
            .put_raw(AssociationId::new(), subject, "president")
            .await;

        let stored = repository.find_role(AssociationId::new(), subject).await;
        assert_eq!(stored.ok().flatten(), None);
    }
}
