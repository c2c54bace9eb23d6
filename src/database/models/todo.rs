use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default page size when `size` is absent from a list request
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// A TODO row as stored in the `todos` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub subject: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Keyset cursor for listing. `prev_id == 0` starts from the newest row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTodoRequest {
    pub prev_id: i64,
    pub size: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTodoRequest {
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTodoRequest {
    pub id: i64,
    pub subject: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteTodoRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadTodoResponse {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTodoResponse {
    pub todo: Todo,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteTodoResponse {}
