use agora_core::{AppResult, AssociationId};
use agora_domain::UserId;
use async_trait::async_trait;

/// Repository port for association membership lookups.
///
/// Implementations perform a single equality-filtered read on both keys and
/// return the raw role column of the matching row, if any. Parsing into
/// [`agora_domain::AssociationRole`] happens in the application layer.
#[async_trait]
pub trait MembershipRoleRepository: Send + Sync {
    /// Finds the stored role value for a subject in an association.
    async fn find_role(
        &self,
        association_id: AssociationId,
        subject: UserId,
    ) -> AppResult<Option<String>>;
}
