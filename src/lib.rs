pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::middleware::{Pipeline, PipelineState};
use crate::services::TodoStore;

/// Build the full router: `/todos` and `/healthz` behind the protected pipeline,
/// `/do-panic` behind the public one.
pub fn app(store: Arc<dyn TodoStore>, state: PipelineState) -> Router {
    Router::new()
        .merge(Pipeline::protected().apply(todo_routes(store), &state))
        .merge(Pipeline::protected().apply(health_routes(), &state))
        .merge(Pipeline::public().apply(demo_routes(), &state))
        .layer(TraceLayer::new_for_http())
}

fn todo_routes(store: Arc<dyn TodoStore>) -> Router {
    use handlers::protected::todos;

    Router::new()
        .route(
            "/todos",
            get(todos::todos_get)
                .post(todos::todos_post)
                .put(todos::todos_put)
                .delete(todos::todos_delete),
        )
        .with_state(store)
}

fn health_routes() -> Router {
    Router::new().route("/healthz", get(handlers::protected::healthz_get))
}

fn demo_routes() -> Router {
    Router::new().route("/do-panic", any(handlers::public::do_panic))
}
