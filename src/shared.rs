use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthConfig, Clock, RejectionReason, SigningKey, TokenIssuer, TokenValidator};
use crate::todo::repository::TodoRepository;
use crate::user::{password::PasswordService, repository::UserRepository};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub todo_repository: Arc<dyn TodoRepository + Send + Sync>,
    pub token_issuer: TokenIssuer,
    pub token_validator: TokenValidator,
    pub password_service: PasswordService,
    pub auth_config: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        todo_repository: Arc<dyn TodoRepository + Send + Sync>,
        signing_key: SigningKey,
        auth_config: AuthConfig,
        password_service: PasswordService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let signing_key = Arc::new(signing_key);
        let auth_config = Arc::new(auth_config);

        Self {
            user_repository,
            todo_repository,
            token_issuer: TokenIssuer::new(signing_key.clone(), auth_config.clone(), clock.clone()),
            token_validator: TokenValidator::new(signing_key, auth_config.clone(), clock),
            password_service,
            auth_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Rejected(#[from] RejectionReason),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Rejected(reason) => (StatusCode::UNAUTHORIZED, reason.to_string()),
            AppError::JwtError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Token error: {}", msg),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::auth::{ManualClock, TokenPair};
    use crate::todo::repository::InMemoryTodoRepository;
    use crate::user::{
        models::{Gender, Role, UserModel},
        repository::InMemoryUserRepository,
    };

    /// Key shared by every test state
    pub const TEST_KEY: [u8; 32] = [11u8; 32];

    /// Built state plus handles to its concrete parts
    pub struct TestContext {
        pub state: AppState,
        pub clock: Arc<ManualClock>,
        pub user_repository: Arc<InMemoryUserRepository>,
        pub todo_repository: Arc<InMemoryTodoRepository>,
    }

    impl TestContext {
        /// Stores a user with the given password and role USER
        pub async fn seed_user(&self, username: &str, password: &str) -> UserModel {
            self.seed_user_with_role(username, password, Role::User)
                .await
        }

        pub async fn seed_user_with_role(
            &self,
            username: &str,
            password: &str,
            role: Role,
        ) -> UserModel {
            let hash = self.state.password_service.hash(password).unwrap();
            let user = UserModel::new(
                username.to_string(),
                hash,
                format!("{} nick", username),
                "2000-01-01".to_string(),
                Gender::Female,
                "010-0000-0000".to_string(),
                role,
            );
            self.state.user_repository.create_user(&user).await.unwrap();
            user
        }

        /// Issues a token pair for a stored user, or role USER when absent
        pub async fn issue_for(&self, username: &str) -> TokenPair {
            let roles = match self.state.user_repository.get_user(username).await.unwrap() {
                Some(user) => user.principal().roles,
                None => [Role::User.to_string()].into_iter().collect(),
            };
            self.state.token_issuer.issue(username, &roles).unwrap()
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        auth_config: AuthConfig,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                auth_config: AuthConfig::default(),
            }
        }

        pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
            self.auth_config = auth_config;
            self
        }

        pub fn build(self) -> TestContext {
            let clock = Arc::new(ManualClock::starting_now());
            let user_repository = Arc::new(InMemoryUserRepository::new());
            let todo_repository = Arc::new(InMemoryTodoRepository::new());

            let state = AppState::new(
                user_repository.clone(),
                todo_repository.clone(),
                SigningKey::from_bytes(&TEST_KEY).unwrap(),
                self.auth_config,
                PasswordService::low_cost(),
                clock.clone(),
            );

            TestContext {
                state,
                clock,
                user_repository,
                todo_repository,
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
