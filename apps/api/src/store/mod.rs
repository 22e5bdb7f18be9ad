//! Narrow storage seam for users and their portfolio records.
//!
//! Handlers and the resume pipeline depend on `PortfolioStore` only;
//! `PgPortfolioStore` is the production backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::message::Message;
use crate::models::portfolio::{
    Award, Certification, Education, Experience, PortfolioRecords, Project, Skill,
};
use crate::models::user::User;

#[cfg(test)]
pub mod memory;

/// An insert collided with a uniqueness constraint. Surfaces as 409.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DuplicateRecord(pub String);

/// Turns a Postgres unique violation (SQLSTATE 23505) into `DuplicateRecord`.
fn unique_violation(err: sqlx::Error, duplicate: impl FnOnce() -> String) -> anyhow::Error {
    let unique = matches!(
        &err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    );
    if unique {
        DuplicateRecord(duplicate()).into()
    } else {
        anyhow::Error::new(err)
    }
}

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn create_user(&self, user: &User) -> Result<()>;

    /// Every child record owned by `owner`, in storage order.
    async fn load_records(&self, owner: Uuid) -> Result<PortfolioRecords>;

    /// Case-insensitive lookup of `owner`'s skill called `name`.
    async fn find_skill_by_name(&self, owner: Uuid, name: &str) -> Result<Option<Skill>>;

    async fn create_skill(&self, skill: &Skill) -> Result<()>;

    async fn create_message(&self, message: &Message) -> Result<()>;

    /// Marks `ids` read where `recipient` owns them; returns the ids updated.
    async fn mark_messages_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>>;
}

pub struct PgPortfolioStore {
    pool: PgPool,
}

impl PgPortfolioStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PortfolioStore for PgPortfolioStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find user by id")
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("find user by email")
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("find user by username")
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, username, email, password_hash, status, role,
                 first_name, middle_name, last_name, portfolio_title, phone,
                 github_url, linkedin_url, hackerrank_url, leetcode_url, website_url,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.status)
        .bind(user.role)
        .bind(&user.first_name)
        .bind(&user.middle_name)
        .bind(&user.last_name)
        .bind(&user.portfolio_title)
        .bind(&user.phone)
        .bind(&user.github_url)
        .bind(&user.linkedin_url)
        .bind(&user.hackerrank_url)
        .bind(&user.leetcode_url)
        .bind(&user.website_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || "Email already registered".into()))
        .context("insert user")?;
        Ok(())
    }

    async fn load_records(&self, owner: Uuid) -> Result<PortfolioRecords> {
        let experiences =
            sqlx::query_as::<_, Experience>("SELECT * FROM experiences WHERE user_id = $1")
                .bind(owner)
                .fetch_all(&self.pool)
                .await
                .context("load experiences")?;
        let educations =
            sqlx::query_as::<_, Education>("SELECT * FROM educations WHERE user_id = $1")
                .bind(owner)
                .fetch_all(&self.pool)
                .await
                .context("load educations")?;
        let projects = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE user_id = $1")
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .context("load projects")?;
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("load skills")?;
        let certifications =
            sqlx::query_as::<_, Certification>("SELECT * FROM certifications WHERE user_id = $1")
                .bind(owner)
                .fetch_all(&self.pool)
                .await
                .context("load certifications")?;
        let awards = sqlx::query_as::<_, Award>("SELECT * FROM awards WHERE user_id = $1")
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .context("load awards")?;

        Ok(PortfolioRecords {
            experiences,
            educations,
            projects,
            skills,
            certifications,
            awards,
        })
    }

    async fn find_skill_by_name(&self, owner: Uuid, name: &str) -> Result<Option<Skill>> {
        sqlx::query_as::<_, Skill>(
            "SELECT * FROM skills WHERE user_id = $1 AND lower(name) = lower($2)",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("find skill by name")
    }

    async fn create_skill(&self, skill: &Skill) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO skills (id, user_id, name, category, proficiency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(skill.id)
        .bind(skill.user_id)
        .bind(&skill.name)
        .bind(&skill.category)
        .bind(skill.proficiency)
        .bind(skill.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || format!("Skill '{}' already exists", skill.name)))
        .context("insert skill")?;
        Ok(())
    }

    async fn create_message(&self, message: &Message) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages
                (id, recipient_user_id, sender_name, sender_email, subject, content, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id)
        .bind(message.recipient_user_id)
        .bind(&message.sender_name)
        .bind(&message.sender_email)
        .bind(&message.subject)
        .bind(&message.content)
        .bind(message.is_read)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .context("insert message")?;
        Ok(())
    }

    async fn mark_messages_read(&self, recipient: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE messages SET is_read = TRUE
            WHERE recipient_user_id = $1 AND id = ANY($2)
            RETURNING id
            "#,
        )
        .bind(recipient)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("mark messages read")
    }
}
