use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::Todo;

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("TODO not found")]
    NotFound,
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Storage error: {0}")]
    Transport(sqlx::Error),
}

impl TodoError {
    /// True when the targeted rows did not exist. Callers branch on this instead of
    /// comparing error values.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TodoError::NotFound)
    }
}

impl From<sqlx::Error> for TodoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = !matches!(db.kind(), ErrorKind::Other)
                || db.message().contains("constraint failed");
            if constraint {
                return TodoError::Constraint(db.message().to_string());
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return TodoError::NotFound;
        }
        TodoError::Transport(err)
    }
}

/// CRUD over TODO entities.
///
/// Handlers hold this as a trait object so the storage backend can be wrapped or
/// replaced without touching request dispatch.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Insert a TODO and return it with its storage-assigned id and timestamps.
    async fn create(&self, subject: &str, description: &str) -> Result<Todo, TodoError>;

    /// Keyset page, newest first. `prev_id == 0` starts at the newest row,
    /// otherwise only ids strictly below `prev_id` are returned.
    async fn read(&self, prev_id: i64, size: i64) -> Result<Vec<Todo>, TodoError>;

    /// Replace subject and description. Fails with `NotFound` when no row has `id`.
    async fn update(&self, id: i64, subject: &str, description: &str) -> Result<Todo, TodoError>;

    /// Remove every listed id in one statement. Fails with `NotFound` only when
    /// nothing at all was removed.
    async fn delete(&self, ids: &[i64]) -> Result<(), TodoError>;
}

const CONFIRM: &str =
    "SELECT id, subject, description, created_at, updated_at FROM todos WHERE id = ?";

/// SQLite-backed TodoStore.
///
/// Statements are not persisted in the connection's statement cache, and
/// multi-statement operations (write then re-read) are not wrapped in a transaction:
/// a concurrent writer can change the row between the two statements.
#[derive(Clone)]
pub struct TodoService {
    pool: SqlitePool,
}

impl TodoService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn confirm(&self, id: i64) -> Result<Todo, TodoError> {
        let todo = sqlx::query_as::<Sqlite, Todo>(CONFIRM)
            .bind(id)
            .persistent(false)
            .fetch_one(&self.pool)
            .await?;
        Ok(todo)
    }
}

#[async_trait]
impl TodoStore for TodoService {
    async fn create(&self, subject: &str, description: &str) -> Result<Todo, TodoError> {
        const INSERT: &str = "INSERT INTO todos (subject, description) VALUES (?, ?)";

        let result = sqlx::query(INSERT)
            .bind(subject)
            .bind(description)
            .persistent(false)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        tracing::debug!("Created todo {}", id);

        self.confirm(id).await
    }

    async fn read(&self, prev_id: i64, size: i64) -> Result<Vec<Todo>, TodoError> {
        const READ: &str = "SELECT id, subject, description, created_at, updated_at \
                            FROM todos ORDER BY id DESC LIMIT ?";
        const READ_WITH_ID: &str = "SELECT id, subject, description, created_at, updated_at \
                                    FROM todos WHERE id < ? ORDER BY id DESC LIMIT ?";

        // SQLite reads a negative LIMIT as no limit at all
        let size = size.max(0);

        let query = if prev_id == 0 {
            sqlx::query_as::<Sqlite, Todo>(READ).bind(size)
        } else {
            sqlx::query_as::<Sqlite, Todo>(READ_WITH_ID).bind(prev_id).bind(size)
        };

        let todos = query.persistent(false).fetch_all(&self.pool).await?;
        Ok(todos)
    }

    async fn update(&self, id: i64, subject: &str, description: &str) -> Result<Todo, TodoError> {
        // Millisecond resolution: updated_at must still advance within the same millisecond
        const UPDATE: &str = "UPDATE todos \
                              SET subject = ?, description = ?, \
                                  updated_at = max( \
                                      strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), \
                                      strftime('%Y-%m-%dT%H:%M:%fZ', updated_at, '+0.001 seconds')) \
                              WHERE id = ?";

        let result = sqlx::query(UPDATE)
            .bind(subject)
            .bind(description)
            .bind(id)
            .persistent(false)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TodoError::NotFound);
        }

        self.confirm(id).await
    }

    async fn delete(&self, ids: &[i64]) -> Result<(), TodoError> {
        if ids.is_empty() {
            return Err(TodoError::Validation("ids must not be empty".to_string()));
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM todos WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = builder
            .build()
            .persistent(false)
            .execute(&self.pool)
            .await?;

        // Partial matches count as success
        if result.rows_affected() == 0 {
            return Err(TodoError::NotFound);
        }

        tracing::debug!("Deleted {} of {} requested todos", result.rows_affected(), ids.len());
        Ok(())
    }
}
