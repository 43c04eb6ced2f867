use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_backend::{
    build_router, cors_layer, AppConfig, AppState, InMemoryTodoRepository,
    InMemoryUserRepository, PasswordService, PostgresTodoRepository, PostgresUserRepository,
    SystemClock, TodoRepository, UserRepository, UserService,
};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn TodoRepository + Send + Sync>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting todo backend");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    let (user_repository, todo_repository) = repositories(&config).await?;

    let cors = cors_layer(&config.cors_allowed_origin, &config.auth.headers)?;
    let app_state = AppState::new(
        user_repository,
        todo_repository,
        config.signing_key,
        config.auth,
        PasswordService::default(),
        Arc::new(SystemClock::new()),
    );

    if let Some(admin) = &config.admin {
        UserService::from_state(&app_state)
            .ensure_admin(&admin.username, &admin.password)
            .await?;
    }

    let app = build_router(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(bind_addr = %config.bind_addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when DATABASE_URL is set, in-memory otherwise
async fn repositories(config: &AppConfig) -> Result<Repositories, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using PostgreSQL repositories");

            Ok((
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresTodoRepository::new(pool)),
            ))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repositories");
            Ok((
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryTodoRepository::new()),
            ))
        }
    }
}
