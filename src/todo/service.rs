use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::TodoModel,
    repository::TodoRepository,
    types::{CreateTodoRequest, UpdateTodoRequest},
};
use crate::auth::Principal;
use crate::shared::{AppError, AppState};

/// Service for todo business logic; every call is scoped to the caller
pub struct TodoService {
    repository: Arc<dyn TodoRepository + Send + Sync>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.todo_repository))
    }

    #[instrument(skip(self, principal, request), fields(username = %principal.username))]
    pub async fn create(
        &self,
        principal: &Principal,
        request: CreateTodoRequest,
    ) -> Result<TodoModel, AppError> {
        let title = non_blank_title(&request.title)?;
        check_window(request.start_at, request.end_at)?;

        let todo = TodoModel::new(
            principal.username.clone(),
            title,
            request.start_at,
            request.end_at,
            request.is_done,
        );
        self.repository.create_todo(&todo).await?;

        info!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<TodoModel>, AppError> {
        self.repository.list_todos_for(&principal.username).await
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<TodoModel, AppError> {
        self.owned(principal, id).await
    }

    #[instrument(skip(self, principal, request), fields(username = %principal.username))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        request: UpdateTodoRequest,
    ) -> Result<TodoModel, AppError> {
        let mut todo = self.owned(principal, id).await?;

        if let Some(title) = request.title.as_deref() {
            todo.title = non_blank_title(title)?;
        }
        let start_at = request.start_at.unwrap_or(todo.start_at);
        let end_at = request.end_at.unwrap_or(todo.end_at);
        check_window(start_at, end_at)?;

        todo.start_at = start_at;
        todo.end_at = end_at;
        if let Some(is_done) = request.is_done {
            todo.is_done = is_done;
        }
        todo.updated_at = Utc::now();

        self.repository.update_todo(&todo).await?;
        info!(todo_id = %todo.id, "Todo updated");
        Ok(todo)
    }

    #[instrument(skip(self, principal), fields(username = %principal.username))]
    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), AppError> {
        self.owned(principal, id).await?;

        if !self.repository.delete_todo(id).await? {
            return Err(not_found());
        }
        info!(todo_id = %id, "Todo deleted");
        Ok(())
    }

    // Foreign todos are reported as missing
    async fn owned(&self, principal: &Principal, id: &str) -> Result<TodoModel, AppError> {
        match self.repository.get_todo(id).await? {
            Some(todo) if todo.is_owned_by(&principal.username) => Ok(todo),
            Some(_) => {
                warn!(todo_id = %id, username = %principal.username, "Todo belongs to another user");
                Err(not_found())
            }
            None => {
                debug!(todo_id = %id, "Todo not found");
                Err(not_found())
            }
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Todo not found".to_string())
}

fn non_blank_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title must not be blank".to_string()));
    }
    Ok(title.to_string())
}

fn check_window(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<(), AppError> {
    if start_at > end_at {
        return Err(AppError::BadRequest(
            "start_at must not be after end_at".to_string(),
        ));
    }
    Ok(())
}
