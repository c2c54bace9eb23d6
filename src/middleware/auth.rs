use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;

use super::pipeline::PipelineState;
use crate::error::ApiError;

/// Configured identifier/secret pair for HTTP Basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user_id: String,
    password: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, user_id: &str, password: &str) -> bool {
        self.user_id == user_id && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Basic authentication middleware. Rejected requests never reach the wrapped handler.
pub async fn basic_auth_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.credentials.as_ref() else {
        tracing::warn!("Rejecting {}: basic auth credentials are not configured", request.uri().path());
        return Err(ApiError::unauthorized("Authentication is not configured"));
    };

    let (user_id, password) = extract_basic_credentials(request.headers()).map_err(|msg| {
        tracing::debug!("Rejecting {}: {}", request.uri().path(), msg);
        ApiError::unauthorized(msg)
    })?;

    if !expected.matches(&user_id, &password) {
        tracing::warn!("Rejecting {}: invalid credentials for '{}'", request.uri().path(), user_id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    Ok(next.run(request).await)
}

/// Extract user id and password from an `Authorization: Basic ...` header
fn extract_basic_credentials(headers: &HeaderMap) -> Result<(String, String), String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    let encoded = auth_str
        .strip_prefix("Basic ")
        .ok_or_else(|| "Authorization header must use Basic scheme".to_string())?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| "Invalid base64 in Authorization header".to_string())?;

    let decoded = String::from_utf8(decoded)
        .map_err(|_| "Authorization credentials are not valid UTF-8".to_string())?;

    let (user_id, password) = decoded
        .split_once(':')
        .ok_or_else(|| "Authorization credentials must be user:password".to_string())?;

    Ok((user_id.to_string(), password.to_string()))
}
