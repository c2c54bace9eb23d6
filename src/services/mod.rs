pub mod todo_service;

pub use todo_service::{TodoError, TodoService, TodoStore};
