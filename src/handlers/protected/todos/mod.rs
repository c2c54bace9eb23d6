pub mod collection;
pub mod utils;

// Re-export handler functions for use in routing
pub use collection::get as todos_get;
pub use collection::post as todos_post;
pub use collection::put as todos_put;
pub use collection::delete as todos_delete;
