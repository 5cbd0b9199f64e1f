use agora_application::MembershipRoleRepository;
use agora_core::{AppError, AppResult, AssociationId};
use agora_domain::UserId;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed membership lookups against `association_members`.
///
/// Expects one row per (association_id, user_id) with a nullable text
/// `role` column.
#[derive(Clone)]
pub struct PostgresMembershipRoleRepository {
    pool: PgPool,
}

impl PostgresMembershipRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRoleRow {
    role: Option<String>,
}

#[async_trait]
impl MembershipRoleRepository for PostgresMembershipRoleRepository {
    async fn find_role(
        &self,
        association_id: AssociationId,
        subject: UserId,
    ) -> AppResult<Option<String>> {
        let row = sqlx::query_as::<_, MembershipRoleRow>(
            r#"
            SELECT role
            FROM association_members
            WHERE association_id = $1
                AND user_id = $2
            LIMIT 1
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(subject.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load role for subject '{subject}' in association '{association_id}': {error}"
            ))
        })?;

        Ok(row.and_then(|row| row.role))
    }
}
