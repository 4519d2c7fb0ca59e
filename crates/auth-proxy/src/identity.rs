use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ProxyError;

/// Thin client over the identity provider's REST API (GoTrue-style
/// surface: `/signup`, `/token`, `/logout`, `/recover`, `/user`).
///
/// The proxy adds nothing to these calls beyond input validation and the
/// response envelope; the wrapped service is the whole value.
pub struct IdentityClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build the client from `IDENTITY_URL` / `IDENTITY_API_KEY`.
    pub fn from_env() -> Result<Self, ProxyError> {
        let base_url = std::env::var("IDENTITY_URL")
            .map_err(|_| ProxyError::Config("IDENTITY_URL is not set".into()))?;
        let api_key = std::env::var("IDENTITY_API_KEY")
            .map_err(|_| ProxyError::Config("IDENTITY_API_KEY is not set".into()))?;
        Ok(Self::new(base_url, api_key))
    }

    // ── Provider calls ──────────────────────────────────────────────

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Value, ProxyError> {
        self.send(
            self.request(Method::POST, "/signup")
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Value, ProxyError> {
        self.send(
            self.request(Method::POST, "/token?grant_type=password")
                .json(&json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), ProxyError> {
        self.send(self.request(Method::POST, "/logout").bearer_auth(token))
            .await?;
        Ok(())
    }

    pub async fn recover(&self, email: &str) -> Result<(), ProxyError> {
        self.send(
            self.request(Method::POST, "/recover")
                .json(&json!({ "email": email })),
        )
        .await?;
        Ok(())
    }

    pub async fn update_password(&self, token: &str, password: &str) -> Result<Value, ProxyError> {
        self.send(
            self.request(Method::PUT, "/user")
                .bearer_auth(token)
                .json(&json!({ "password": password })),
        )
        .await
    }

    pub async fn get_user(&self, token: &str) -> Result<Value, ProxyError> {
        self.send(self.request(Method::GET, "/user").bearer_auth(token))
            .await
    }

    pub async fn delete_user(&self, token: &str) -> Result<(), ProxyError> {
        self.send(self.request(Method::DELETE, "/user").bearer_auth(token))
            .await?;
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.api_key)
    }

    /// Send a request and forward the provider's verdict: 2xx bodies come
    /// back as JSON, 4xx become `Provider` errors with the provider's own
    /// status and message, 5xx and transport failures become `Upstream`.
    async fn send(&self, request: RequestBuilder) -> Result<Value, ProxyError> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        let message = provider_message(&body)
            .unwrap_or_else(|| format!("identity provider returned {status}"));
        debug!(%status, %message, "identity provider error");

        if status.is_server_error() {
            return Err(ProxyError::Upstream(message));
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(ProxyError::Unauthorized(message)),
            StatusCode::FORBIDDEN => Err(ProxyError::Forbidden(message)),
            _ => Err(ProxyError::Provider {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

/// Pull a human-readable message out of a provider error body.
/// GoTrue uses `msg`, OAuth-style errors use `error_description`.
fn provider_message(body: &Value) -> Option<String> {
    for key in ["msg", "message", "error_description", "error"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            if !msg.is_empty() {
                return Some(msg.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_message_prefers_msg() {
        let body = json!({ "msg": "user exists", "error": "conflict" });
        assert_eq!(provider_message(&body).as_deref(), Some("user exists"));
    }

    #[test]
    fn provider_message_reads_error_description() {
        let body = json!({ "error": "", "error_description": "bad grant" });
        assert_eq!(provider_message(&body).as_deref(), Some("bad grant"));
    }

    #[test]
    fn provider_message_none_for_unknown_shape() {
        assert_eq!(provider_message(&json!({ "weird": 1 })), None);
        assert_eq!(provider_message(&Value::Null), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = IdentityClient::new("https://id.example.com/", "key");
        assert_eq!(client.base_url, "https://id.example.com");
    }
}
