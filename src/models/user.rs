use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Admin,
    Manager,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::User, UserRole::Admin, UserRole::Manager];

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
            UserRole::Manager => "MANAGER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|r| r.as_str() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Pending,
    Suspended,
    Withdrawn,
}

impl UserStatus {
    pub const ALL: [UserStatus; 4] = [
        UserStatus::Active,
        UserStatus::Pending,
        UserStatus::Suspended,
        UserStatus::Withdrawn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Pending => "PENDING",
            UserStatus::Suspended => "SUSPENDED",
            UserStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|v| v.as_str() == upper)
    }
}

/// A marketplace account. Registration creates a PENDING user; an admin
/// activation (or an approved USER_REGISTRATION request) makes it ACTIVE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never the plaintext.
    pub password: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub business_type: Option<String>,
    pub profile_image: Option<String>,
    pub introduction: Option<String>,
    pub skills: Option<Vec<String>>,
    pub role: UserRole,
    pub status: UserStatus,
    pub rating: f64,
    pub project_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn register(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password: password_hash,
            phone: None,
            company_name: None,
            business_type: None,
            profile_image: None,
            introduction: None,
            skills: None,
            role: UserRole::User,
            status: UserStatus::Pending,
            rating: 0.0,
            project_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_starts_pending_with_user_role() {
        let user = User::register("kim".into(), "kim@example.com".into(), "hash".into());
        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.project_count, 0);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(UserStatus::parse("active"), Some(UserStatus::Active));
        assert_eq!(UserStatus::parse("WITHDRAWN"), Some(UserStatus::Withdrawn));
        assert_eq!(UserStatus::parse("nope"), None);
    }

    #[test]
    fn role_serializes_screaming_snake() {
        let json = serde_json::to_string(&UserRole::Manager).unwrap();
        assert_eq!(json, "\"MANAGER\"");
    }
}
