use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::TodoModel;
use crate::shared::AppError;

/// Trait for todo repository operations
#[async_trait]
pub trait TodoRepository {
    async fn create_todo(&self, todo: &TodoModel) -> Result<(), AppError>;
    async fn get_todo(&self, id: &str) -> Result<Option<TodoModel>, AppError>;
    /// Todos owned by `username`, ordered by start time
    async fn list_todos_for(&self, username: &str) -> Result<Vec<TodoModel>, AppError>;
    async fn update_todo(&self, todo: &TodoModel) -> Result<(), AppError>;
    /// Returns whether a row was removed
    async fn delete_todo(&self, id: &str) -> Result<bool, AppError>;
}

/// In-memory implementation of TodoRepository for development and testing
pub struct InMemoryTodoRepository {
    todos: Mutex<HashMap<String, TodoModel>>,
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self {
            todos: Mutex::new(HashMap::new()),
        }
    }

    pub fn todo_count(&self) -> usize {
        self.todos.lock().unwrap().len()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    #[instrument(skip(self, todo))]
    async fn create_todo(&self, todo: &TodoModel) -> Result<(), AppError> {
        debug!(todo_id = %todo.id, username = %todo.username, "Creating todo in memory");

        let mut todos = self.todos.lock().unwrap();
        todos.insert(todo.id.clone(), todo.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_todo(&self, id: &str) -> Result<Option<TodoModel>, AppError> {
        let todos = self.todos.lock().unwrap();
        Ok(todos.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_todos_for(&self, username: &str) -> Result<Vec<TodoModel>, AppError> {
        let todos = self.todos.lock().unwrap();
        let mut owned: Vec<TodoModel> = todos
            .values()
            .filter(|todo| todo.is_owned_by(username))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));

        debug!(username = %username, todo_count = owned.len(), "Listed todos from memory");
        Ok(owned)
    }

    #[instrument(skip(self, todo))]
    async fn update_todo(&self, todo: &TodoModel) -> Result<(), AppError> {
        let mut todos = self.todos.lock().unwrap();
        if !todos.contains_key(&todo.id) {
            warn!(todo_id = %todo.id, "Todo not found for update in memory");
            return Err(AppError::NotFound("Todo not found".to_string()));
        }
        todos.insert(todo.id.clone(), todo.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_todo(&self, id: &str) -> Result<bool, AppError> {
        let mut todos = self.todos.lock().unwrap();
        Ok(todos.remove(id).is_some())
    }
}

/// PostgreSQL implementation of todo repository
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TODO_COLUMNS: &str = "id, username, title, start_at, end_at, is_done, created_at, updated_at";

fn todo_from_row(row: &PgRow) -> TodoModel {
    TodoModel {
        id: row.get("id"),
        username: row.get("username"),
        title: row.get("title"),
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
        is_done: row.get("is_done"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
    #[instrument(skip(self, todo))]
    async fn create_todo(&self, todo: &TodoModel) -> Result<(), AppError> {
        debug!(todo_id = %todo.id, username = %todo.username, "Creating todo in database");

        sqlx::query(
            "INSERT INTO todos (id, username, title, start_at, end_at, is_done, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        )
        .bind(&todo.id)
        .bind(&todo.username)
        .bind(&todo.title)
        .bind(todo.start_at)
        .bind(todo.end_at)
        .bind(todo.is_done)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create todo in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_todo(&self, id: &str) -> Result<Option<TodoModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM todos WHERE id = $1", TODO_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, todo_id = %id, "Failed to fetch todo from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(row.as_ref().map(todo_from_row))
    }

    #[instrument(skip(self))]
    async fn list_todos_for(&self, username: &str) -> Result<Vec<TodoModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM todos WHERE username = $1 ORDER BY start_at, id",
            TODO_COLUMNS
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to list todos from database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(username = %username, todo_count = rows.len(), "Listed todos from database");
        Ok(rows.iter().map(todo_from_row).collect())
    }

    #[instrument(skip(self, todo))]
    async fn update_todo(&self, todo: &TodoModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE todos SET title = $2, start_at = $3, end_at = $4, is_done = $5, updated_at = $6 WHERE id = $1"
        )
        .bind(&todo.id)
        .bind(&todo.title)
        .bind(todo.start_at)
        .bind(todo.end_at)
        .bind(todo.is_done)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, todo_id = %todo.id, "Failed to update todo in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(todo_id = %todo.id, "Todo not found for update");
            return Err(AppError::NotFound("Todo not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_todo(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, todo_id = %id, "Failed to delete todo from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
