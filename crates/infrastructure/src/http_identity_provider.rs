//! Identity provider backed by the hosted auth REST API.

use agora_application::{AuthSession, IdentityProvider};
use agora_core::{AppError, AppResult, UserIdentity};
use agora_domain::EmailAddress;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::hosted_backend::{HostedBackend, read_error};

/// HTTP implementation of [`IdentityProvider`].
#[derive(Clone)]
pub struct HttpIdentityProvider {
    backend: HostedBackend,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    expires_at: Option<i64>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: uuid::Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl HttpIdentityProvider {
    /// Creates a provider for the given backend.
    #[must_use]
    pub fn new(backend: HostedBackend) -> Self {
        Self { backend }
    }

    fn token_url(&self, grant_type: &str) -> AppResult<Url> {
        let mut url = self.backend.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    fn recover_url(&self, redirect_url: &str) -> AppResult<Url> {
        let mut url = self.backend.endpoint("auth/v1/recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_url);
        Ok(url)
    }

    async fn exchange_token(&self, grant_type: &str, body: Value) -> AppResult<AuthSession> {
        let response = self
            .backend
            .post(self.token_url(grant_type)?)
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("auth token request transport error: {error}"))
            })?;

        if !response.status().is_success() {
            let (status, message) = read_error(response).await;
            return Err(classify_failure(status, message));
        }

        let payload = response.json::<TokenResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode auth token response: {error}"))
        })?;

        Ok(session_from_token_response(payload, Utc::now()))
    }
}

/// 4xx responses carry messages meant for the user; anything else is ours.
fn classify_failure(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Unauthorized(message)
        }
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        status if status.is_client_error() => AppError::Validation(message),
        _ => AppError::Internal(message),
    }
}

fn session_from_token_response(payload: TokenResponse, now: DateTime<Utc>) -> AuthSession {
    let expires_at = payload
        .expires_at
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_else(|| now + Duration::seconds(payload.expires_in));

    let display_name = ["display_name", "full_name", "name"]
        .iter()
        .find_map(|key| payload.user.user_metadata.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
        .or_else(|| {
            payload
                .user
                .email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .map(str::to_owned)
        })
        .unwrap_or_default();

    AuthSession {
        access_token: payload.access_token,
        refresh_token: payload.refresh_token,
        expires_at,
        user: UserIdentity::new(payload.user.id, display_name, payload.user.email),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> AppResult<AuthSession> {
        self.exchange_token(
            "password",
            json!({ "email": email.as_str(), "password": password }),
        )
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> AppResult<AuthSession> {
        self.exchange_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .backend
            .post(self.backend.endpoint("auth/v1/logout")?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("sign-out transport error: {error}")))?;

        // An already-revoked token still ends the session.
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        let (status, message) = read_error(response).await;
        Err(classify_failure(status, message))
    }

    async fn request_password_reset(
        &self,
        email: &EmailAddress,
        redirect_url: &str,
    ) -> AppResult<()> {
        let response = self
            .backend
            .post(self.recover_url(redirect_url)?)
            .json(&json!({ "email": email.as_str() }))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("password reset transport error: {error}"))
            })?;

        if response.status().is_success() {
            return Ok(());
        }

        let (status, message) = read_error(response).await;
        Err(match status {
            status if status.is_client_error() => AppError::Validation(message),
            _ => AppError::Internal(message),
        })
    }
}
