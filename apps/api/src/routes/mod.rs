pub mod health;
pub mod skills;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::notify::handlers as notify;
use crate::render::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/token", post(auth::handle_token))
        .route("/api/v1/auth/refresh", post(auth::handle_refresh))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        .route("/api/v1/auth/tokens/cleanup", post(auth::handle_cleanup))
        .route("/api/v1/auth/tokens/stats", get(auth::handle_stats))
        // Resume
        .route("/api/v1/resume/latex", get(resume::handle_resume_pdf))
        .route("/api/v1/resume/source", get(resume::handle_resume_source))
        // Portfolio
        .route("/api/v1/skills", post(skills::handle_create_skill))
        // Messages
        .route("/api/v1/messages", post(notify::handle_send_message))
        .route("/api/v1/messages/read", post(notify::handle_mark_read))
        .route("/ws/messages", get(notify::handle_messages_socket))
        .with_state(state)
}
