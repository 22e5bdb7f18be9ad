//! Authentication and authorization failures.
//!
//! Everything except `Forbidden` and the infrastructure variants surfaces as
//! 401; `Forbidden` is the only 403.

use thiserror::Error;

use crate::auth::roles::Role;
use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Inactive user")]
    Inactive,

    #[error("Token owner no longer exists")]
    UnknownUser,

    #[error("Insufficient permissions: requires role '{required}'")]
    Forbidden { required: Role },

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden { required } => AppError::Forbidden(format!(
                "Insufficient permissions: requires role '{required}'"
            )),
            AuthError::Signing(e) => AppError::Internal(anyhow::Error::new(e)),
            AuthError::Store(e) => AppError::from(e),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}
