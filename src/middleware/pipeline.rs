use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use std::fmt;
use std::sync::Arc;

use super::access::{access_middleware, AccessSink, TracingAccessSink};
use super::auth::{basic_auth_middleware, Credentials};
use super::context::context_middleware;
use super::recovery::{recovery_middleware, PanicResponse};

/// A request-wrapping stage. Each stage either runs the rest of the chain or
/// answers on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Catch panics from everything inside it
    Recovery,
    /// Attach the per-request RequestContext
    Context,
    /// Emit an AccessRecord with latency, path and OS
    Access,
    /// Require the configured Basic credentials
    BasicAuth,
}

/// Shared inputs for every stage
#[derive(Clone)]
pub struct PipelineState {
    pub credentials: Option<Credentials>,
    pub access_sink: Arc<dyn AccessSink>,
    pub panic_response: PanicResponse,
}

impl PipelineState {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials,
            access_sink: Arc::new(TracingAccessSink),
            panic_response: PanicResponse::default(),
        }
    }

    pub fn with_access_sink(mut self, access_sink: Arc<dyn AccessSink>) -> Self {
        self.access_sink = access_sink;
        self
    }

    pub fn with_panic_response(mut self, panic_response: PanicResponse) -> Self {
        self.panic_response = panic_response;
        self
    }
}

impl fmt::Debug for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineState")
            .field("credentials", &self.credentials)
            .field("panic_response", &self.panic_response)
            .finish_non_exhaustive()
    }
}

/// Ordered list of stages, outermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Recovery → Context → Access
    pub fn public() -> Self {
        Self::new(vec![Stage::Recovery, Stage::Context, Stage::Access])
    }

    /// Recovery → Context → Access → BasicAuth.
    ///
    /// BasicAuth sits inside Access, so rejected attempts are still logged.
    pub fn protected() -> Self {
        Self::new(vec![
            Stage::Recovery,
            Stage::Context,
            Stage::Access,
            Stage::BasicAuth,
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Wrap every route of `router` in this pipeline.
    ///
    /// axum runs the most recently added layer first, so stages are added innermost first.
    pub fn apply<S>(&self, router: Router<S>, state: &PipelineState) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.stages
            .iter()
            .rev()
            .fold(router, |router, stage| stage.wrap(router, state.clone()))
    }
}

impl Stage {
    fn wrap<S>(self, router: Router<S>, state: PipelineState) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self {
            Stage::Recovery => router.layer(from_fn_with_state(state, recovery_middleware)),
            Stage::Context => router.layer(from_fn(context_middleware)),
            Stage::Access => router.layer(from_fn_with_state(state, access_middleware)),
            Stage::BasicAuth => router.layer(from_fn_with_state(state, basic_auth_middleware)),
        }
    }
}
