// handlers/protected/mod.rs - Handlers served behind Basic authentication
//
// Routes here are wrapped in Pipeline::protected():
// Recovery → Context → Access → BasicAuth → handler

pub mod healthz;
pub mod todos;

pub use healthz::get as healthz_get;
pub use todos::*;
