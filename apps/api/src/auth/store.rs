//! Server-side allow-list of issued access tokens.
//!
//! Each record is addressed by its own token string, so no locking is
//! needed: a concurrent delete simply makes the loser see "not found".

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::token::{AccessTokenRecord, TokenStats};

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fails if a record for the same token string already exists.
    async fn insert(&self, record: &AccessTokenRecord) -> Result<()>;

    async fn find(&self, token: &str) -> Result<Option<AccessTokenRecord>>;

    /// Returns whether a record was removed.
    async fn delete(&self, token: &str) -> Result<bool>;

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> Result<()>;

    /// Removes every record with `expires_at <= now`; returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<TokenStats>;
}

pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, record: &AccessTokenRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens
                (token, user_id, username, role, created_at, expires_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(&record.username)
        .bind(record.role)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.last_used_at)
        .execute(&self.pool)
        .await
        .context("insert access token")?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<AccessTokenRecord>> {
        sqlx::query_as::<_, AccessTokenRecord>("SELECT * FROM access_tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .context("find access token")
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("delete access token")?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE access_tokens SET last_used_at = $2 WHERE token = $1")
            .bind(token)
            .bind(at)
            .execute(&self.pool)
            .await
            .context("update token last_used_at")?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .context("delete expired access tokens")?;
        Ok(result.rows_affected())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<TokenStats> {
        let (total, expired): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE expires_at <= $1)
            FROM access_tokens
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("count access tokens")?;

        let total = total.max(0) as u64;
        let expired = expired.max(0) as u64;
        Ok(TokenStats {
            total_tokens: total,
            expired_tokens: expired,
            active_tokens: total.saturating_sub(expired),
        })
    }
}
