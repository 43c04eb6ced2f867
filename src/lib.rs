// Library crate for the todo backend
// This file exposes the public API for integration tests

pub mod auth;
pub mod config;
pub mod router;
pub mod shared;
pub mod todo;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::{
    Clock, ManualClock, Principal, RejectionReason, SigningKey, SystemClock, TokenIssuer,
    TokenType, TokenValidator,
};
pub use config::{AppConfig, ConfigError};
pub use router::{build_router, cors_layer};
pub use shared::{AppError, AppState};
pub use todo::repository::{InMemoryTodoRepository, PostgresTodoRepository, TodoRepository};
pub use user::{
    password::PasswordService,
    repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
    UserService,
};
