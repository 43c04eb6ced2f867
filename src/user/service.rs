use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{Gender, ProfilePatch, Role, UserModel},
    password::PasswordService,
    repository::UserRepository,
    types::{JoinRequest, LoginRequest, UpdateProfileRequest, UserSummary},
};
use crate::auth::{
    IssuedToken, Principal, RejectionReason, TokenIssuer, TokenPair, TokenType, TokenValidator,
};
use crate::shared::{AppError, AppState};

// Same message for unknown user and wrong password
const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Service for account and token business logic
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    passwords: PasswordService,
    issuer: TokenIssuer,
    validator: TokenValidator,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        passwords: PasswordService,
        issuer: TokenIssuer,
        validator: TokenValidator,
    ) -> Self {
        Self {
            repository,
            passwords,
            issuer,
            validator,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.user_repository),
            state.password_service.clone(),
            state.token_issuer.clone(),
            state.token_validator.clone(),
        )
    }

    /// Registers a new account with role USER
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn join(&self, request: JoinRequest) -> Result<UserModel, AppError> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username must not be blank".to_string()));
        }
        if request.password.trim().is_empty() {
            return Err(AppError::BadRequest("Password must not be blank".to_string()));
        }

        if self.repository.get_user(&username).await?.is_some() {
            warn!(username = %username, "Username already taken");
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let user = UserModel::new(
            username,
            self.passwords.hash(&request.password)?,
            request.nickname,
            request.birth,
            request.gender,
            request.phone,
            Role::User,
        );
        self.repository.create_user(&user).await?;

        info!(username = %user.username, user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Creates the administrator account if it does not exist yet
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<(), AppError> {
        if let Some(existing) = self.repository.get_user(username).await? {
            if existing.role != Role::Admin {
                warn!(username = %username, "Configured admin account exists without ADMIN role");
            }
            return Ok(());
        }

        let admin = UserModel::new(
            username.to_string(),
            self.passwords.hash(password)?,
            username.to_string(),
            String::new(),
            Gender::Male,
            String::new(),
            Role::Admin,
        );
        self.repository.create_user(&admin).await?;

        info!(username = %username, "Administrator account created");
        Ok(())
    }

    /// Checks credentials and mints an access/refresh pair
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AppError> {
        let user = match self.repository.get_user(request.username.trim()).await? {
            Some(user) => user,
            None => {
                warn!("Login for unknown user");
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        };

        if !self.passwords.verify(&request.password, &user.password_hash) {
            warn!("Login with wrong password");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        let principal = user.principal();
        let pair = self.issuer.issue(&principal.username, &principal.roles)?;

        info!(username = %principal.username, "Login successful");
        Ok(pair)
    }

    /// Mints a fresh access token from a valid refresh token.
    ///
    /// When the caller also presents its (possibly expired) access token,
    /// both must name the same subject.
    #[instrument(skip(self, refresh_token, access_token))]
    pub async fn reissue(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<IssuedToken, AppError> {
        let claims = self
            .validator
            .validate_claims(refresh_token, TokenType::Refresh)
            .map_err(|reason| {
                warn!(reason = %reason, "Refresh token rejected");
                AppError::Rejected(reason)
            })?;

        if let Some(access_token) = access_token {
            let access_subject = self
                .validator
                .subject_ignoring_expiry(access_token, TokenType::Access)
                .map_err(|reason| {
                    warn!(reason = %reason, "Presented access token rejected during reissue");
                    AppError::Rejected(reason)
                })?;

            if access_subject != claims.sub {
                warn!(
                    refresh_subject = %claims.sub,
                    access_subject = %access_subject,
                    "Tokens belong to different users"
                );
                return Err(AppError::Unauthorized(
                    "Tokens belong to different users".to_string(),
                ));
            }
        }

        let user = self.repository.get_user(&claims.sub).await?.ok_or_else(|| {
            warn!(username = %claims.sub, "Refresh token subject no longer exists");
            AppError::Rejected(RejectionReason::UserNotFound)
        })?;

        // Roles come from storage, not from the refresh token
        let principal = user.principal();
        let token = self
            .issuer
            .issue_access(&principal.username, &principal.roles)?;

        info!(username = %principal.username, exp = token.claims.exp, "Access token reissued");
        Ok(token)
    }

    pub async fn username_available(&self, username: &str) -> Result<bool, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(false);
        }
        Ok(self.repository.get_user(username).await?.is_none())
    }

    /// Re-checks the caller's password
    #[instrument(skip(self, principal, password), fields(username = %principal.username))]
    pub async fn verify_password(
        &self,
        principal: &Principal,
        password: &str,
    ) -> Result<(), AppError> {
        let user = self.current_user(principal).await?;

        if !self.passwords.verify(password, &user.password_hash) {
            warn!("Password re-verification failed");
            return Err(AppError::Unauthorized("Password does not match".to_string()));
        }
        Ok(())
    }

    /// Applies the non-blank fields of the request to the caller's profile
    #[instrument(skip(self, principal, request), fields(username = %principal.username))]
    pub async fn update_profile(
        &self,
        principal: &Principal,
        request: UpdateProfileRequest,
    ) -> Result<UserModel, AppError> {
        let mut user = self.current_user(principal).await?;

        let password_hash = match request.password.as_deref() {
            Some(password) if !password.trim().is_empty() => Some(self.passwords.hash(password)?),
            _ => None,
        };

        let changed = user.apply(ProfilePatch {
            password_hash,
            nickname: request.nickname,
            birth: request.birth,
            gender: request.gender,
            phone: request.phone,
        });

        if changed {
            self.repository.update_user(&user).await?;
            info!("Profile updated");
        }
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AppError> {
        let users = self.repository.list_users().await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }

    async fn current_user(&self, principal: &Principal) -> Result<UserModel, AppError> {
        self.repository
            .get_user(&principal.username)
            .await?
            .ok_or(AppError::Rejected(RejectionReason::UserNotFound))
    }
}
