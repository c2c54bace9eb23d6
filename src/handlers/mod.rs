// handlers/mod.rs - Handlers grouped by the pipeline that serves them
pub mod protected; // Pipeline::protected() - Basic auth required
pub mod public; // Pipeline::public() - no authentication
