use agora_application::{AuthSession, MembershipRoleRepository};
use agora_core::{AppError, AppResult, AssociationId};
use agora_domain::UserId;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use crate::hosted_backend::{HostedBackend, read_error};

/// Membership lookups through the hosted backend's REST interface.
///
/// Requests carry the signed-in user's access token when a session feed is
/// attached, so row-level policies on the table apply; otherwise the public
/// API key is used as bearer.
#[derive(Clone)]
pub struct PostgrestMembershipRoleRepository {
    backend: HostedBackend,
    table: String,
    session: Option<watch::Receiver<Option<AuthSession>>>,
}

#[derive(Debug, Deserialize)]
struct MembershipRoleRow {
    role: Option<String>,
}

impl PostgrestMembershipRoleRepository {
    /// Creates a repository reading from `table`.
    pub fn new(backend: HostedBackend, table: impl Into<String>) -> AppResult<Self> {
        let table = table.into();
        if !is_valid_table_name(table.as_str()) {
            return Err(AppError::Validation(format!(
                "membership table name '{table}' must be lowercase snake_case"
            )));
        }

        Ok(Self {
            backend,
            table,
            session: None,
        })
    }

    /// Authenticates requests with the session published by the auth context.
    #[must_use]
    pub fn with_session_updates(
        mut self,
        session: watch::Receiver<Option<AuthSession>>,
    ) -> Self {
        self.session = Some(session);
        self
    }

    fn role_lookup_url(&self, association_id: AssociationId, subject: UserId) -> AppResult<Url> {
        let mut url = self.backend.endpoint(format!("rest/v1/{}", self.table).as_str())?;
        url.query_pairs_mut()
            .append_pair("select", "role")
            .append_pair("association_id", format!("eq.{association_id}").as_str())
            .append_pair("user_id", format!("eq.{subject}").as_str())
            .append_pair("limit", "1");
        Ok(url)
    }

    fn bearer_token(&self) -> String {
        self.session
            .as_ref()
            .and_then(|session| {
                session
                    .borrow()
                    .as_ref()
                    .map(|session| session.access_token.clone())
            })
            .unwrap_or_else(|| self.backend.api_key().to_owned())
    }
}

fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && table.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        })
}

fn decode_role_rows(body: &str) -> AppResult<Option<String>> {
    let rows = serde_json::from_str::<Vec<MembershipRoleRow>>(body).map_err(|error| {
        AppError::Internal(format!("failed to decode membership rows: {error}"))
    })?;

    Ok(rows.into_iter().next().and_then(|row| row.role))
}

#[async_trait]
impl MembershipRoleRepository for PostgrestMembershipRoleRepository {
    async fn find_role(
        &self,
        association_id: AssociationId,
        subject: UserId,
    ) -> AppResult<Option<String>> {
        let url = self.role_lookup_url(association_id, subject)?;

        let response = self
            .backend
            .get(url)
            .bearer_auth(self.bearer_token())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "membership lookup transport error for association '{association_id}': {error}"
                ))
            })?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(AppError::Internal(format!(
                "membership lookup for association '{association_id}' failed with status {status}: {message}"
            )));
        }

        let body = response.text().await.map_err(|error| {
            AppError::Internal(format!("failed to read membership lookup response: {error}"))
        })?;

        let role = decode_role_rows(body.as_str())?;
        debug!(
            association_id = %association_id,
            subject = %subject,
            found = role.is_some(),
            "membership role fetched"
        );
        Ok(role)
    }
}
