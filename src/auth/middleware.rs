use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use super::{
    headers::bearer_token,
    types::{Principal, RejectionReason, TokenType},
};
use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates the access token header and adds a Principal to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(principal): Extension<Principal>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_name = &state.auth_config.headers.access;

    let principal = {
        let token = bearer_token(req.headers(), header_name).ok_or_else(|| {
            warn!(header = %header_name, uri = %req.uri(), "Missing access token");
            AppError::Unauthorized("Missing access token".to_string())
        })?;

        state
            .token_validator
            .validate(token, TokenType::Access)
            .map_err(|reason| {
                warn!(reason = %reason, uri = %req.uri(), "Access token rejected");
                AppError::Rejected(reason)
            })?
    };

    // The token may outlive the account it names
    if state
        .user_repository
        .get_user(&principal.username)
        .await?
        .is_none()
    {
        warn!(username = %principal.username, "Access token subject no longer exists");
        return Err(AppError::Rejected(RejectionReason::UserNotFound));
    }

    info!(
        username = %principal.username,
        uri = %req.uri(),
        "Authentication successful, adding principal to request"
    );

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Fails with 403 unless the principal carries `role`
pub fn require_role(principal: &Principal, role: &str) -> Result<(), AppError> {
    if principal.has_role(role) {
        Ok(())
    } else {
        warn!(username = %principal.username, role = %role, "Missing required role");
        Err(AppError::Forbidden(format!("Requires role {}", role)))
    }
}
