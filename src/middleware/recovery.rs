use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;

use super::pipeline::PipelineState;
use crate::error::ApiError;

/// What the client sees when a handler panics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanicResponse {
    /// Empty body with 200 OK, matching the service's historical behavior
    #[default]
    Legacy,
    /// 500 with the JSON error body
    ServerError,
}

impl PanicResponse {
    fn response(self) -> Response {
        match self {
            PanicResponse::Legacy => StatusCode::OK.into_response(),
            PanicResponse::ServerError => {
                ApiError::internal_server_error("Internal server error").into_response()
            }
        }
    }
}

impl FromStr for PanicResponse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(PanicResponse::Legacy),
            "server-error" | "server_error" | "500" => Ok(PanicResponse::ServerError),
            other => Err(format!("Unknown panic response mode: {}", other)),
        }
    }
}

/// Contain panics from every inner stage and handler
pub async fn recovery_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            tracing::error!(
                path = %path,
                panic = %panic_message(payload.as_ref()),
                "Recovered from panic while handling request"
            );
            state.panic_response.response()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
