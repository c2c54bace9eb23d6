use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthzResponse {
    pub message: &'static str,
}

/// GET /healthz - Liveness check
pub async fn get() -> Json<HealthzResponse> {
    Json(HealthzResponse { message: "OK" })
}
