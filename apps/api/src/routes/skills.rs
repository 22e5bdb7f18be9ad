use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::guard::Authorized;
use crate::auth::roles::Admin;
use crate::errors::AppError;
use crate::models::portfolio::Skill;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub proficiency: i32,
}

/// POST /api/v1/skills
///
/// Skill names are unique per owner, compared case-insensitively.
pub async fn handle_create_skill(
    State(state): State<AppState>,
    admin: Authorized<Admin>,
    Json(req): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), AppError> {
    let owner = admin.principal.user_id;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("skill name must not be empty".into()));
    }
    if !(0..=100).contains(&req.proficiency) {
        return Err(AppError::Validation(
            "proficiency must be between 0 and 100".into(),
        ));
    }
    if state.portfolio.find_skill_by_name(owner, name).await?.is_some() {
        return Err(AppError::Conflict(format!("Skill '{name}' already exists")));
    }

    let skill = Skill {
        id: Uuid::new_v4(),
        user_id: owner,
        name: name.to_string(),
        category: req.category.trim().to_string(),
        proficiency: req.proficiency,
        created_at: Utc::now(),
    };
    state.portfolio.create_skill(&skill).await?;
    info!("Created skill '{}' for user {owner}", skill.name);
    Ok((StatusCode::CREATED, Json(skill)))
}
