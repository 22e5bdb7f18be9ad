use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::errors::AuthError;
use crate::auth::guard::{authorize, AuthUser, Authorized, BearerToken};
use crate::auth::jwt::TokenSubject;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::roles::{Admin, Role};
use crate::auth::service::IssuedToken;
use crate::errors::AppError;
use crate::models::token::TokenStats;
use crate::models::user::{NewUser, User};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

fn subject_of(user: &User) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("'{email}' is not a valid email address")))
    }
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<IssuedToken>), AppError> {
    let email = req.email.trim().to_string();
    validate_email(&email)?;
    if state.portfolio.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = NewUser {
        username: email.clone(),
        email,
        password_hash: hash_password(&req.password)?,
        role: Role::Viewer,
        first_name: req.first_name.filter(|s| !s.trim().is_empty()),
        last_name: req.last_name.filter(|s| !s.trim().is_empty()),
    }
    .into_user();
    state.portfolio.create_user(&user).await?;
    info!("Registered user {} ({})", user.id, user.email);

    let issued = state.tokens.issue(&subject_of(&user)).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// POST /api/v1/auth/token
pub async fn handle_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<IssuedToken>, AppError> {
    let user = state
        .portfolio
        .find_user_by_username(req.username.trim())
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or(AuthError::InvalidCredentials)?;
    if !user.is_active() {
        return Err(AuthError::Inactive.into());
    }

    Ok(Json(state.tokens.issue(&subject_of(&user)).await?))
}

/// POST /api/v1/auth/refresh
///
/// The old token must still authorize its owner, so inactive or deleted
/// accounts cannot mint new tokens.
pub async fn handle_refresh(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<IssuedToken>, AppError> {
    let principal = authorize(&state.tokens, state.portfolio.as_ref(), &token, None).await?;
    let issued = state.tokens.refresh(&token).await?;
    info!("Refreshed access token for user {}", principal.user_id);
    Ok(Json(issued))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>, AppError> {
    let outcome = state.tokens.revoke(&token).await?;
    Ok(Json(json!({ "status": outcome })))
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<User>, AppError> {
    let user = state
        .portfolio
        .find_user(principal.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

/// POST /api/v1/auth/tokens/cleanup
pub async fn handle_cleanup(
    State(state): State<AppState>,
    admin: Authorized<Admin>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.tokens.sweep().await?;
    info!("Admin {} triggered token cleanup", admin.principal.username);
    Ok(Json(json!({ "deleted": deleted })))
}

/// GET /api/v1/auth/tokens/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    _admin: Authorized<Admin>,
) -> Result<Json<TokenStats>, AppError> {
    Ok(Json(state.tokens.stats().await?))
}
