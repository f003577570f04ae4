//! HTTP client for the storefront REST API.
//!
//! Provides a minimal client with configurable auth (Bearer token for signed-in
//! users, `X-Session-Id` for guests), generic request helpers that classify failures
//! into [`AppError`], and one domain method per REST call (see [`api`]). The
//! [`StorefrontApi`] trait is the seam the wizard is written against.

pub mod api;
pub mod traits;

use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use storybook_core::{AppError, StorefrontConfig};

pub use api::PhotoUpload;
pub use traits::{ProgressCallback, StorefrontApi};

/// Header carrying the guest session for unauthenticated cart calls.
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-Session-Id: {session_id}`
    Guest { session_id: String },
    /// No credentials (catalog browsing only)
    Anonymous,
}

impl Auth {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Auth::Bearer(_))
    }
}

/// HTTP client for the storefront API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create a client from configuration. Uses the access token when one is set,
    /// otherwise the given guest session id.
    pub fn from_config(
        config: &StorefrontConfig,
        guest_session_id: Option<String>,
    ) -> anyhow::Result<Self> {
        let auth = match (&config.access_token, guest_session_id) {
            (Some(token), _) => Auth::Bearer(token.clone()),
            (None, Some(session_id)) => Auth::Guest { session_id },
            (None, None) => Auth::Anonymous,
        };
        Self::new(config.api_url.clone(), auth, config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::Guest { session_id } => request.header(SESSION_HEADER, session_id.as_str()),
            Auth::Anonymous => request,
        }
    }

    /// Send a request, returning the response only when the status is a success.
    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        tracing::debug!(status = %status, message = ?message, "API request failed");

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(message.unwrap_or_default()));
        }
        Err(AppError::server(status.as_u16(), message))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Decode(format!("Failed to parse response as JSON: {}", e)))
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, AppError> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let request = self.client.delete(self.build_url(path));
        self.send(request).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `error` and `detail` in JSON bodies; short plain-text bodies
/// are used as-is.
pub fn extract_error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return Some(s.trim().to_string())
                }
                Some(serde_json::Value::Object(inner)) => {
                    if let Some(serde_json::Value::String(s)) = inner.get("message") {
                        return Some(s.trim().to_string());
                    }
                }
                _ => {}
            }
        }
        return None;
    }

    if body.len() <= 200 && !body.starts_with('<') {
        return Some(body.to_string());
    }
    None
}

pub use storybook_core::models::{
    AddCartItemRequest, Book, BookPage, Cart, CartItem, CreatePersonalizationRequest,
    PersonalizationDraft, UpdatePersonalizationRequest, UploadPhotoResponse,
};
