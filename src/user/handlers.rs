use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    Extension, Json,
};
use tracing::{info, instrument, warn};

use super::{
    models::Role,
    service::UserService,
    types::{
        ExistNameRequest, ExistNameResponse, JoinRequest, LoginRequest, LoginResponse,
        MessageResponse, ReissueResponse, UpdateProfileRequest, UserSummary, VerificationRequest,
        VerificationResponse,
    },
};
use crate::auth::{as_bearer, bearer_token, require_role, Principal};
use crate::shared::{AppError, AppState};

/// HTTP handler for account registration
///
/// POST /api/v1/users/join
#[instrument(name = "join", skip(state, request))]
pub async fn join(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = UserService::from_state(&state).join(request).await?;

    info!(username = %user.username, "Join completed");
    Ok(Json(MessageResponse::new("Join complete")))
}

/// HTTP handler for login
///
/// POST /api/v1/users/login
/// Tokens are returned both in the access/refresh headers (as `Bearer <token>`) and in the body
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    let pair = UserService::from_state(&state).login(request).await?;

    let names = &state.auth_config.headers;
    let mut headers = HeaderMap::new();
    headers.insert(names.access.clone(), bearer_value(&pair.access_token.token)?);
    headers.insert(names.refresh.clone(), bearer_value(&pair.refresh_token.token)?);

    Ok((
        headers,
        Json(LoginResponse {
            msg: "Login complete".to_string(),
            access_expires_at: pair.access_token.expires_at(),
            refresh_expires_at: pair.refresh_token.expires_at(),
            access_token: pair.access_token.token,
            refresh_token: pair.refresh_token.token,
        }),
    ))
}

/// HTTP handler for minting a new access token
///
/// POST /api/v1/users/reissue
/// Reads the refresh header and, when present, the access header
#[instrument(name = "reissue", skip(state, headers))]
pub async fn reissue(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<ReissueResponse>), AppError> {
    let names = &state.auth_config.headers;

    let refresh_token = bearer_token(&headers, &names.refresh).ok_or_else(|| {
        warn!(header = %names.refresh, "Reissue without refresh token");
        AppError::Unauthorized("Missing refresh token".to_string())
    })?;
    let access_token = bearer_token(&headers, &names.access);

    let token = UserService::from_state(&state)
        .reissue(refresh_token, access_token)
        .await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(names.access.clone(), bearer_value(&token.token)?);

    Ok((
        response_headers,
        Json(ReissueResponse {
            msg: "Access token reissued".to_string(),
            access_expires_at: token.expires_at(),
            access_token: token.token,
        }),
    ))
}

/// HTTP handler for username availability
///
/// POST /api/v1/users/exist/name
#[instrument(name = "exist_name", skip(state))]
pub async fn exist_name(
    State(state): State<AppState>,
    Json(request): Json<ExistNameRequest>,
) -> Result<Json<ExistNameResponse>, AppError> {
    let available = UserService::from_state(&state)
        .username_available(&request.username)
        .await?;

    Ok(Json(ExistNameResponse { available }))
}

/// POST /api/v1/users/user/verification
#[instrument(name = "verify_password", skip_all, fields(username = %principal.username))]
pub async fn verify_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<VerificationRequest>,
) -> Result<Json<VerificationResponse>, AppError> {
    UserService::from_state(&state)
        .verify_password(&principal, &request.password)
        .await?;

    Ok(Json(VerificationResponse { verified: true }))
}

/// POST /api/v1/users/user/update
#[instrument(name = "update_profile", skip_all, fields(username = %principal.username))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::from_state(&state)
        .update_profile(&principal, request)
        .await?;

    Ok(Json(MessageResponse::new("Profile updated")))
}

/// GET /api/v1/admin/users
#[instrument(name = "list_users", skip_all, fields(username = %principal.username))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    require_role(&principal, Role::Admin.as_ref())?;

    let users = UserService::from_state(&state).list_users().await?;
    info!(user_count = users.len(), "Users listed");
    Ok(Json(users))
}

fn bearer_value(token: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&as_bearer(token)).map_err(|e| {
        warn!(error = %e, "Token is not a valid header value");
        AppError::Internal
    })
}
