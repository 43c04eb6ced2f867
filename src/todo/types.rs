use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::TodoModel;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub is_done: bool,
}

/// Partial update; absent fields are kept
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub is_done: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TodoModel> for TodoResponse {
    fn from(todo: TodoModel) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            start_at: todo.start_at,
            end_at: todo.end_at,
            is_done: todo.is_done,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_is_done() {
        let json = r#"{
            "title": "gym",
            "start_at": "2024-05-01T09:00:00Z",
            "end_at": "2024-05-01T10:00:00Z"
        }"#;

        let request: CreateTodoRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.title, "gym");
        assert!(!request.is_done);
    }

    #[test]
    fn test_update_request_partial() {
        let request: UpdateTodoRequest = serde_json::from_str(r#"{"is_done": true}"#).unwrap();
        assert_eq!(request.is_done, Some(true));
        assert!(request.title.is_none());
        assert!(request.start_at.is_none());
    }
}
