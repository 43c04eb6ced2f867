use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Gender, Role, UserModel};

/// Request payload for registering a new account
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub birth: String,
    pub gender: Gender,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by login; the same tokens also travel in the access/refresh headers
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub msg: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReissueResponse {
    pub msg: String,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ExistNameRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistNameResponse {
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub verified: bool,
}

/// Partial profile update; omitted or blank fields are kept
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub password: Option<String>,
    pub nickname: Option<String>,
    pub birth: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Account listing entry for administrators
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub nickname: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for UserSummary {
    fn from(user: UserModel) -> Self {
        Self {
            username: user.username,
            nickname: user.nickname,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_request_deserialization() {
        let json = r#"{
            "username": "alice",
            "password": "pw",
            "nickname": "Al",
            "birth": "1999-09-09",
            "gender": "FEMALE",
            "phone": "010-1234-5678"
        }"#;

        let request: JoinRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.gender, Gender::Female);
    }

    #[test]
    fn test_join_request_ignores_client_role() {
        // Clients cannot pick their own role; the field is simply not part of the payload
        let json = r#"{
            "username": "alice",
            "password": "pw",
            "nickname": "Al",
            "birth": "1999-09-09",
            "gender": "MALE",
            "phone": "010",
            "role": "ADMIN"
        }"#;

        assert!(serde_json::from_str::<JoinRequest>(json).is_ok());
    }

    #[test]
    fn test_update_profile_request_all_optional() {
        let request: UpdateProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(request.password.is_none());
        assert!(request.gender.is_none());
    }
}
