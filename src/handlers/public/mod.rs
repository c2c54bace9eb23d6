// handlers/public/mod.rs - Handlers served without authentication
//
// Routes here are wrapped in Pipeline::public():
// Recovery → Context → Access → handler

pub mod panic;

pub use panic::do_panic;
