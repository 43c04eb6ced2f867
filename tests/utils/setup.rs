use std::sync::Arc;

use todo_backend::{
    auth::AuthConfig, build_router, AppState, InMemoryTodoRepository, InMemoryUserRepository,
    ManualClock, PasswordService, SigningKey,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_KEY: [u8; 32] = [42u8; 32];

pub struct TestSetup {
    pub state: AppState,
    pub app: axum::Router,
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub todos: Arc<InMemoryTodoRepository>,
}

pub struct TestSetupBuilder {
    auth_config: AuthConfig,
    admin: Option<(String, String)>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            auth_config: AuthConfig::default(),
            admin: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    #[allow(dead_code)]
    pub fn with_admin(mut self, username: &str, password: &str) -> Self {
        self.admin = Some((username.to_string(), password.to_string()));
        self
    }

    pub async fn build(self) -> TestSetup {
        let clock = Arc::new(ManualClock::starting_now());
        let users = Arc::new(InMemoryUserRepository::new());
        let todos = Arc::new(InMemoryTodoRepository::new());

        let state = AppState::new(
            users.clone(),
            todos.clone(),
            SigningKey::from_bytes(&TEST_KEY).unwrap(),
            self.auth_config,
            PasswordService::low_cost(),
            clock.clone(),
        );

        if let Some((username, password)) = &self.admin {
            todo_backend::UserService::from_state(&state)
                .ensure_admin(username, password)
                .await
                .unwrap();
        }

        TestSetup {
            app: build_router(state.clone()),
            state,
            clock,
            users,
            todos,
        }
    }
}
