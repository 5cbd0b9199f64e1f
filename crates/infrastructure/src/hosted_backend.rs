use agora_core::{AppError, AppResult};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Connection settings shared by the adapters that talk to the hosted backend.
#[derive(Clone)]
pub struct HostedBackend {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HostedBackend {
    /// Creates backend settings from a base URL and the project's public API key.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
    ) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid backend URL '{base_url}': {error}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "backend URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Validation(
                "backend API key must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("failed to build backend URL for '{path}': {error}"))
        })
    }

    pub(crate) fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.http_client.get(url).header("apikey", self.api_key.as_str())
    }

    pub(crate) fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.http_client
            .post(url)
            .header("apikey", self.api_key.as_str())
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.as_str()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Extracts the human-readable message from a backend error body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let payload = serde_json::from_str::<ErrorPayload>(body).unwrap_or_default();

    payload
        .error_description
        .or(payload.msg)
        .or(payload.message)
        .or(payload.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("backend request failed with status {status}"))
}

/// Reads a failed response into an error message.
pub(crate) async fn read_error(response: reqwest::Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, error_message(status, body.as_str()))
}
