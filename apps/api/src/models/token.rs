use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::roles::Role;

/// Server-side record of one issued access token. A token is valid only
/// while its record exists and `expires_at` lies in the future.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl AccessTokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total_tokens: u64,
    pub expired_tokens: u64,
    pub active_tokens: u64,
}
