pub mod access;
pub mod auth;
pub mod context;
pub mod pipeline;
pub mod recovery;
pub mod response;

pub use access::{AccessRecord, AccessSink, TracingAccessSink};
pub use auth::{basic_auth_middleware, Credentials};
pub use context::{context_middleware, Os, RequestContext};
pub use pipeline::{Pipeline, PipelineState, Stage};
pub use recovery::{recovery_middleware, PanicResponse};
pub use response::{ApiResponse, ApiResult};
