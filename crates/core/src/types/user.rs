//! User account and authentication wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CityId, UserId};

/// Account role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    /// Whether this role may use the order-approval console and catalog
    /// mutations.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    pub email: String,
    pub name: String,
    pub city: CityId,
    pub role: Role,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// New-account submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub city: CityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Payload returned by login, register, and token refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_admin_check() {
        assert!(Role::Admin.is_admin());
        assert!(Role::Manager.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_auth_response_deserializes() {
        let response: AuthResponse = serde_json::from_str(
            r#"{
                "user": {"_id": "u1", "email": "a@b.co", "name": "Ada", "city": "c1", "role": "USER"},
                "accessToken": "at",
                "refreshToken": "rt"
            }"#,
        )
        .expect("deserialize");

        assert_eq!(response.user.role, Role::User);
        assert_eq!(response.access_token, "at");
        assert_eq!(response.refresh_token, "rt");
    }
}
