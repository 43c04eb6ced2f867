use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, instrument};

use super::{
    service::TodoService,
    types::{CreateTodoRequest, TodoResponse, UpdateTodoRequest},
};
use crate::auth::Principal;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a todo
///
/// POST /api/v1/todos
#[instrument(name = "create_todo", skip_all, fields(username = %principal.username))]
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    let todo = TodoService::from_state(&state)
        .create(&principal, request)
        .await?;

    Ok((StatusCode::CREATED, Json(todo.into())))
}

/// GET /api/v1/todos
#[instrument(name = "list_todos", skip_all, fields(username = %principal.username))]
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = TodoService::from_state(&state).list(&principal).await?;

    info!(todo_count = todos.len(), "Todos listed");
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

/// GET /api/v1/todos/:id
#[instrument(name = "get_todo", skip(state, principal), fields(username = %principal.username))]
pub async fn get_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = TodoService::from_state(&state)
        .get(&principal, &todo_id)
        .await?;

    Ok(Json(todo.into()))
}

/// PATCH /api/v1/todos/:id
#[instrument(name = "update_todo", skip(state, principal, request), fields(username = %principal.username))]
pub async fn update_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = TodoService::from_state(&state)
        .update(&principal, &todo_id, request)
        .await?;

    Ok(Json(todo.into()))
}

/// DELETE /api/v1/todos/:id
#[instrument(name = "delete_todo", skip(state, principal), fields(username = %principal.username))]
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(todo_id): Path<String>,
) -> Result<StatusCode, AppError> {
    TodoService::from_state(&state)
        .delete(&principal, &todo_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
