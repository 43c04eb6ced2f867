use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::auth::Principal;

/// Authorization role; its name is what tokens carry in `roles`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

/// Database model for users table
#[derive(Debug, Clone)]
pub struct UserModel {
    pub id: String,            // UUID v4 as string
    pub username: String,      // Unique login name, also the token subject
    pub password_hash: String, // Argon2 PHC string
    pub nickname: String,
    pub birth: String,
    pub gender: Gender,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change; blank or absent values are left alone
#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub password_hash: Option<String>,
    pub nickname: Option<String>,
    pub birth: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
}

impl UserModel {
    pub fn new(
        username: String,
        password_hash: String,
        nickname: String,
        birth: String,
        gender: Gender,
        phone: String,
        role: Role,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            nickname,
            birth,
            gender,
            phone,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// The identity tokens for this user carry
    pub fn principal(&self) -> Principal {
        Principal::new(self.username.clone(), [self.role.to_string()])
    }

    /// Applies the non-blank fields of `patch`, returns whether anything changed
    pub fn apply(&mut self, patch: ProfilePatch) -> bool {
        let mut changed = false;

        if let Some(hash) = non_blank(patch.password_hash) {
            self.password_hash = hash;
            changed = true;
        }
        if let Some(nickname) = non_blank(patch.nickname) {
            self.nickname = nickname;
            changed = true;
        }
        if let Some(birth) = non_blank(patch.birth) {
            self.birth = birth;
            changed = true;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
            changed = true;
        }
        if let Some(phone) = non_blank(patch.phone) {
            self.phone = phone;
            changed = true;
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_user() -> UserModel {
        UserModel::new(
            "alice".to_string(),
            "hash".to_string(),
            "Al".to_string(),
            "1999-09-09".to_string(),
            Gender::Female,
            "010-1234-5678".to_string(),
            Role::User,
        )
    }

    #[test]
    fn test_new_user_model() {
        let user = sample_user();
        assert!(!user.id.is_empty());
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_principal_carries_role_name() {
        let mut user = sample_user();
        assert!(user.principal().has_role("USER"));

        user.role = Role::Admin;
        let principal = user.principal();
        assert_eq!(principal.username, "alice");
        assert!(principal.has_role("ADMIN"));
        assert_eq!(principal.roles.len(), 1);
    }

    #[test]
    fn test_apply_skips_blank_fields() {
        let mut user = sample_user();
        let changed = user.apply(ProfilePatch {
            password_hash: None,
            nickname: Some("  ".to_string()),
            birth: Some(String::new()),
            gender: None,
            phone: Some("010-9999-9999".to_string()),
        });

        assert!(changed);
        assert_eq!(user.nickname, "Al");
        assert_eq!(user.birth, "1999-09-09");
        assert_eq!(user.phone, "010-9999-9999");
        assert!(user.updated_at >= user.created_at);
    }

    #[test]
    fn test_apply_empty_patch_changes_nothing() {
        let mut user = sample_user();
        let before = user.updated_at;

        assert!(!user.apply(ProfilePatch::default()));
        assert_eq!(user.updated_at, before);
    }

    #[test]
    fn test_enum_string_forms() {
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert_eq!(Role::from_str("USER").unwrap(), Role::User);
        assert_eq!(Gender::from_str("MALE").unwrap(), Gender::Male);
        assert!(Role::from_str("root").is_err());
        assert_eq!(
            serde_json::to_string(&Gender::Female).unwrap(),
            "\"FEMALE\""
        );
    }
}
