use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

const FALLBACK_FILENAME: &str = "Resume.pdf";

#[derive(Debug, Deserialize)]
pub struct ResumeQuery {
    pub user_id: Uuid,
}

/// `<First>_<Last>_Resume.pdf`, spaces replaced with underscores.
pub fn resume_filename(user: &User) -> String {
    let stem = [&user.first_name, &user.last_name]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        format!("{stem}_Resume.pdf").replace(' ', "_")
    }
}

async fn assemble_for(state: &AppState, user_id: Uuid) -> Result<(User, String), AppError> {
    let user = state
        .portfolio
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let records = state.portfolio.load_records(user.id).await?;
    let markup = state.assembler.assemble(&user, &records);
    Ok((user, markup))
}

/// GET /api/v1/resume/latex?user_id=
pub async fn handle_resume_pdf(
    State(state): State<AppState>,
    Query(query): Query<ResumeQuery>,
) -> Result<Response, AppError> {
    let (user, markup) = assemble_for(&state, query.user_id).await?;
    let pdf = state.compiler.compile(&markup).await?;
    let filename = resume_filename(&user);
    info!("Rendered resume for user {} as {filename}", user.id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// GET /api/v1/resume/source?user_id=
pub async fn handle_resume_source(
    State(state): State<AppState>,
    Query(query): Query<ResumeQuery>,
) -> Result<Response, AppError> {
    let (_, markup) = assemble_for(&state, query.user_id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        markup,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::sample_user;

    #[test]
    fn test_filename_from_names() {
        let mut user = sample_user();
        assert_eq!(resume_filename(&user), "Ada_Lovelace_Resume.pdf");
        user.first_name = Some("Ada Augusta".into());
        assert_eq!(resume_filename(&user), "Ada_Augusta_Lovelace_Resume.pdf");
    }

    #[test]
    fn test_filename_with_one_name() {
        let mut user = sample_user();
        user.first_name = None;
        assert_eq!(resume_filename(&user), "Lovelace_Resume.pdf");
    }

    #[test]
    fn test_filename_falls_back_when_names_blank() {
        let mut user = sample_user();
        user.first_name = Some(" ".into());
        user.last_name = None;
        assert_eq!(resume_filename(&user), "Resume.pdf");
    }
}
