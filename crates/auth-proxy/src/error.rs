use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::dto::ApiResponse;

/// Error surface of the auth proxy. Every variant maps to an HTTP status
/// and is rendered as the uniform `{success, message}` envelope.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Error reported by the identity provider, forwarded with its status.
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Provider unreachable or returned garbage.
    #[error("identity provider unavailable: {0}")]
    Upstream(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProxyError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProxyError::Provider { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiResponse::<()>::failure(self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Upstream(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        assert_eq!(
            ProxyError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unauthorized_maps_to_401() {
        assert_eq!(
            ProxyError::Unauthorized("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn provider_status_is_forwarded() {
        let e = ProxyError::Provider {
            status: 403,
            message: "banned".into(),
        };
        assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bogus_provider_status_falls_back_to_500() {
        let e = ProxyError::Provider {
            status: 0,
            message: "?".into(),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_maps_to_502() {
        assert_eq!(
            ProxyError::Upstream("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
