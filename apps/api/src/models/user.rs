use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::roles::{AccountStatus, Role};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: AccountStatus,
    pub role: Role,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub portfolio_title: Option<String>,
    pub phone: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub hackerrank_url: Option<String>,
    pub leetcode_url: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First, middle and last name joined by single spaces, blanks skipped.
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            status: AccountStatus::Active,
            role: self.role,
            first_name: self.first_name,
            middle_name: None,
            last_name: self.last_name,
            portfolio_title: None,
            phone: None,
            github_url: None,
            linkedin_url: None,
            hackerrank_url: None,
            leetcode_url: None,
            website_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    NewUser {
        username: "ada@example.com".into(),
        email: "ada@example.com".into(),
        password_hash: String::new(),
        role: Role::Viewer,
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
    }
    .into_user()
}
