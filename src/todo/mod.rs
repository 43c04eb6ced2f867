mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;

pub use handlers::{create_todo, delete_todo, get_todo, list_todos, update_todo};
pub use models::TodoModel;
pub use service::TodoService;
