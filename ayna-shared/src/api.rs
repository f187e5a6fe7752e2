//! REST client for the chat backend.
//!
//! The same code runs natively (CLI) and in the browser; reqwest picks the
//! fetch-based transport on `wasm32`.

use crate::auth::AuthGateway;
use crate::chat::MessagePersistence;
use crate::models::{
    CreateMessageRequest, ErrorEnvelope, LoginRequest, LoginResponse, MessageListResponse,
    MessageRecord, RegisterRequest,
};
use crate::session::IdentityVerifier;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Errors produced while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {status}{}", describe(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

fn describe(message: &Option<String>) -> String {
    message.as_ref().map(|text| format!(": {text}")).unwrap_or_default()
}

impl ApiError {
    /// The message the backend put in its error envelope, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Thin client over the five backend endpoints the app consumes.
#[derive(Clone, Debug)]
pub struct ChatApiClient {
    base_url: String,
    client: Client,
}

impl ChatApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:1337`).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {token}"))
    }

    async fn send(request: RequestBuilder, endpoint: &str) -> Result<Response, ApiError> {
        debug!(endpoint, "sending backend request");
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let envelope = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<ErrorEnvelope>(&body).ok())
            .unwrap_or_default();
        if let Some(error) = &envelope.error {
            debug!(endpoint, status = status.as_u16(), %error, "backend rejected request");
        } else {
            debug!(endpoint, status = status.as_u16(), "backend rejected request");
        }
        let message = envelope.message().map(str::to_string);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    /// `POST /api/auth/local`.
    pub async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let request = self.client.post(self.api_url("auth/local")).json(payload);
        let response = Self::send(request, "auth/local").await?;
        Self::decode(response).await
    }

    /// `POST /api/auth/local/register`.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.api_url("auth/local/register"))
            .json(payload);
        Self::send(request, "auth/local/register").await?;
        Ok(())
    }

    /// `GET /api/users/me`; any 2xx means the token is still good.
    pub async fn current_user(&self, token: &str) -> Result<(), ApiError> {
        let request = Self::authorized(self.client.get(self.api_url("users/me")), token);
        Self::send(request, "users/me").await?;
        Ok(())
    }

    /// `GET /api/chat-messages`.
    pub async fn list_messages(&self) -> Result<Vec<MessageRecord>, ApiError> {
        let request = self.client.get(self.api_url("chat-messages"));
        let response = Self::send(request, "chat-messages").await?;
        let body: MessageListResponse = Self::decode(response).await?;
        Ok(body.into_records())
    }

    /// `POST /api/chat-messages` with only the message text.
    pub async fn create_message(&self, token: &str, text: &str) -> Result<(), ApiError> {
        let request = Self::authorized(self.client.post(self.api_url("chat-messages")), token)
            .json(&CreateMessageRequest::new(text));
        Self::send(request, "chat-messages").await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl IdentityVerifier for ChatApiClient {
    async fn verify_token(&self, token: &str) -> Result<(), ApiError> {
        self.current_user(token).await
    }
}

#[async_trait(?Send)]
impl AuthGateway for ChatApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        ChatApiClient::login(self, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        ChatApiClient::register(self, request).await
    }
}

#[async_trait(?Send)]
impl MessagePersistence for ChatApiClient {
    async fn persist_message(&self, text: &str, token: &str) -> Result<(), ApiError> {
        self.create_message(token, text).await
    }
}
