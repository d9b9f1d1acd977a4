use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Credentials submitted by the login form.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Identity confirmed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: BackendUser,
    pub api_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub api_token: String,
    pub refresh_token: Option<String>,
}

/// The out-of-scope authentication collaborator behind `/auth/*`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, BackendError>;
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, BackendError>;
    /// Server-side invalidation on logout; callers treat failures as
    /// best-effort.
    async fn invalidate(&self, api_token: &str) -> Result<(), BackendError>;
}

/// `reqwest`-backed client for the school backend's REST contract.
///
/// Responses use the `{ success, message, data }` envelope.
#[derive(Clone)]
pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    refresh_token: Option<String>,
    user: BackendUser,
}

#[derive(Debug, Deserialize)]
struct RefreshData {
    token: String,
    #[serde(default, rename = "refreshToken")]
    refresh_token: Option<String>,
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, BackendError> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        match response.json::<Envelope<LoginData>>().await {
            Ok(envelope) if envelope.success => {
                let data = envelope
                    .data
                    .ok_or_else(|| BackendError::Decode("login envelope missing data".into()))?;
                Ok(LoginOutcome {
                    user: data.user,
                    api_token: data.token,
                    refresh_token: data.refresh_token,
                })
            }
            Ok(envelope) if status.is_client_error() || status.is_success() => {
                let message = envelope
                    .message
                    .unwrap_or_else(|| "Invalid credentials".to_string());
                Err(BackendError::InvalidCredentials(message))
            }
            Ok(_) => Err(BackendError::Status(status.as_u16())),
            Err(err) if status.is_success() => Err(BackendError::Decode(err.to_string())),
            Err(_) => Err(BackendError::Status(status.as_u16())),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, BackendError> {
        let url = format!("{}/auth/refresh", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let envelope: Envelope<RefreshData> = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "refresh rejected".to_string());
            return Err(BackendError::Rejected(message));
        }

        let data = envelope
            .data
            .ok_or_else(|| BackendError::Decode("refresh envelope missing data".into()))?;
        Ok(RefreshOutcome {
            api_token: data.token,
            refresh_token: data.refresh_token,
        })
    }

    async fn invalidate(&self, api_token: &str) -> Result<(), BackendError> {
        let url = format!("{}/auth/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_token)
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
