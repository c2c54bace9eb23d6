use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use super::context::{Os, RequestContext};
use super::pipeline::PipelineState;

/// One access log entry. Emitted, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    pub timestamp: DateTime<Utc>,
    /// Milliseconds spent in the inner stages and the handler
    pub latency_ms: i64,
    pub path: String,
    pub os: Os,
}

/// Destination for access records
pub trait AccessSink: Send + Sync {
    fn record(&self, access: AccessRecord);
}

/// Writes each record as a JSON line through tracing under the `access` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAccessSink;

impl AccessSink for TracingAccessSink {
    fn record(&self, access: AccessRecord) {
        match serde_json::to_string(&access) {
            Ok(json) => tracing::info!(
                target: "access",
                latency_ms = access.latency_ms,
                path = %access.path,
                os = %access.os,
                "{}",
                json
            ),
            Err(e) => tracing::error!("Failed to serialize access record: {}", e),
        }
    }
}

/// Time the rest of the chain and emit an AccessRecord once it returns
pub async fn access_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let timestamp = Utc::now();
    let start = Instant::now();

    let path = request.uri().path().to_string();
    let os = request
        .extensions()
        .get::<RequestContext>()
        .map(|context| context.os)
        .unwrap_or(Os::Unknown);

    let response = next.run(request).await;

    let latency_ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);
    state.access_sink.record(AccessRecord {
        timestamp,
        latency_ms,
        path,
        os,
    });

    response
}
