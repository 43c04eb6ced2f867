use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{Gender, Role, UserModel};
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, username: &str) -> Result<Option<UserModel>, AppError>;
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Data is keyed by username and is lost when the application restarts.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Drops a user; account deletion is not exposed over HTTP
    pub fn remove_user(&self, username: &str) -> Option<UserModel> {
        self.users.lock().unwrap().remove(username)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(username = %user.username, "Creating user in memory");

        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.username) {
            warn!(username = %user.username, "Username already taken in memory");
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        users.insert(user.username.clone(), user.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let user = users.get(username).cloned();

        debug!(username = %username, found = user.is_some(), "Fetched user from memory");
        Ok(user)
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.username) {
            warn!(username = %user.username, "User not found for update in memory");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        users.insert(user.username.clone(), user.clone());

        debug!(username = %user.username, "User updated in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let users = self.users.lock().unwrap();
        let mut all: Vec<UserModel> = users.values().cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, password_hash, nickname, birth, gender, phone, role, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<UserModel, AppError> {
    let gender: String = row.get("gender");
    let role: String = row.get("role");

    Ok(UserModel {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        nickname: row.get("nickname"),
        birth: row.get("birth"),
        gender: Gender::from_str(&gender)
            .map_err(|_| AppError::DatabaseError(format!("Unknown gender {}", gender)))?,
        phone: row.get("phone"),
        role: Role::from_str(&role)
            .map_err(|_| AppError::DatabaseError(format!("Unknown role {}", role)))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(username = %user.username, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, nickname, birth, gender, phone, role, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(&user.birth)
        .bind(user.gender.as_ref())
        .bind(&user.phone)
        .bind(user.role.as_ref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    warn!(username = %user.username, "Username already taken in database");
                    return AppError::Conflict("Username already exists".to_string());
                }
            }
            warn!(error = %e, "Failed to create user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(username = %username, found = row.is_some(), "Fetched user from database");
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, nickname = $3, birth = $4, gender = $5, phone = $6, role = $7, updated_at = $8 WHERE username = $1"
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(&user.birth)
        .bind(user.gender.as_ref())
        .bind(&user.phone)
        .bind(user.role.as_ref())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %user.username, "Failed to update user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(username = %user.username, "User not found for update");
            return Err(AppError::NotFound("User not found".to_string()));
        }

        debug!(username = %user.username, "User updated in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users from database");
            AppError::DatabaseError(e.to_string())
        })?;

        rows.iter().map(user_from_row).collect()
    }
}
