use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Database model for todos table
#[derive(Debug, Clone, PartialEq)]
pub struct TodoModel {
    pub id: String,       // UUID v4 as string
    pub username: String, // Owner
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TodoModel {
    pub fn new(
        username: String,
        title: String,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        is_done: bool,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            username,
            title,
            start_at,
            end_at,
            is_done,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }
}
