use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// Uniform response envelope for every endpoint, success or failure.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// ── Request bodies ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ProxyError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ProxyError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ProxyError::Validation("password is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ProxyError> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<(), ProxyError> {
        validate_password(&self.password)
    }
}

// ── Validation helpers ──────────────────────────────────────────────

/// Minimal structural email check: non-empty local part and a domain
/// containing a dot. Real verification is the provider's job.
pub fn validate_email(email: &str) -> Result<(), ProxyError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ProxyError::Validation("invalid email address".into()))
    }
}

pub fn validate_password(password: &str) -> Result<(), ProxyError> {
    if password.len() < 8 {
        return Err(ProxyError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}
