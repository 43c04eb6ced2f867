use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, TokenHeaders};
use crate::config::ConfigError;
use crate::shared::AppState;
use crate::{todo, user};

/// Builds the full HTTP surface; routes needing an access token sit behind `jwt_auth`
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/user/verification", post(user::verify_password))
        .route("/api/v1/users/user/update", post(user::update_profile))
        .route("/api/v1/admin/users", get(user::list_users))
        .route("/api/v1/todos", post(todo::create_todo).get(todo::list_todos))
        .route(
            "/api/v1/todos/:id",
            get(todo::get_todo)
                .patch(todo::update_todo)
                .delete(todo::delete_todo),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/v1/users/join", post(user::join))
        .route("/api/v1/users/login", post(user::login))
        .route("/api/v1/users/reissue", post(user::reissue))
        .route("/api/v1/users/exist/name", post(user::exist_name))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for a single browser origin, exposing the token headers so clients can read them
pub fn cors_layer(allowed_origin: &str, headers: &TokenHeaders) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(allowed_origin).map_err(|e| ConfigError::Invalid {
        name: "CORS_ALLOWED_ORIGIN",
        reason: e.to_string(),
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            headers.access.clone(),
            headers.refresh.clone(),
        ])
        .expose_headers([headers.access.clone(), headers.refresh.clone()])
        .allow_credentials(true))
}
