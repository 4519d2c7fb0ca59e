use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::dto::{
    ApiResponse, LoginRequest, RegisterRequest, ResetPasswordRequest, UpdatePasswordRequest,
};
use crate::error::ProxyError;
use crate::state::AppState;

/// Extract the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<String, ProxyError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ProxyError::Unauthorized("missing Authorization header".into()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ProxyError::Unauthorized("expected a bearer token".into()))?;
    if token.is_empty() {
        return Err(ProxyError::Unauthorized("empty bearer token".into()));
    }
    Ok(token.to_string())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ProxyError> {
    req.validate()?;
    let user = state.identity.sign_up(&req.email, &req.password).await?;
    info!("registered new account");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("account created", user)),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<Value>>, ProxyError> {
    req.validate()?;
    let session = state.identity.sign_in(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::success("signed in", session)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ProxyError> {
    let token = bearer_token(&headers)?;
    state.identity.sign_out(&token).await?;
    Ok(Json(ApiResponse::success_empty("signed out")))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ProxyError> {
    req.validate()?;
    state.identity.recover(&req.email).await?;
    Ok(Json(ApiResponse::success_empty(
        "password reset email sent",
    )))
}

pub async fn update_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<ApiResponse<Value>>, ProxyError> {
    let token = bearer_token(&headers)?;
    req.validate()?;
    let user = state.identity.update_password(&token, &req.password).await?;
    Ok(Json(ApiResponse::success("password updated", user)))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Value>>, ProxyError> {
    let token = bearer_token(&headers)?;
    let user = state.identity.get_user(&token).await?;
    Ok(Json(ApiResponse::success("ok", user)))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ProxyError> {
    let token = bearer_token(&headers)?;
    state.identity.delete_user(&token).await?;
    info!("account deleted");
    Ok(Json(ApiResponse::success_empty("account deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn bearer_token_extracts_token() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn bearer_token_rejects_missing_header() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn bearer_token_rejects_other_scheme() {
        let headers = headers_with("Basic dXNlcjpwdw==");
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn bearer_token_rejects_empty_token() {
        let headers = headers_with("Bearer ");
        assert!(bearer_token(&headers).is_err());
    }
}
