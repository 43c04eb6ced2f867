// Public API - what other modules can use
pub use handlers::{exist_name, join, list_users, login, reissue, update_profile, verify_password};
pub use models::{Gender, Role, UserModel};
pub use service::UserService;

// Internal modules
mod handlers;
pub mod models;
pub mod password;
pub mod repository;
mod service;
pub mod types;
