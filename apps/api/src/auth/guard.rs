//! Access guard: token → principal, plus the axum extractors built on it.
//!
//! `AuthUser` accepts any authenticated, active account. `Authorized<R>`
//! additionally requires the account's role to equal `R::ROLE` exactly.

use std::marker::PhantomData;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::roles::{RequiredRole, Role};
use crate::auth::service::TokenService;
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::PortfolioStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Validates `token`, loads its owner and applies the exact-match role check.
///
/// The role compared is the account's current role, not the one captured
/// in the token at issuance.
pub async fn authorize(
    tokens: &TokenService,
    users: &dyn PortfolioStore,
    token: &str,
    required: Option<Role>,
) -> Result<Principal, AuthError> {
    let record = tokens.validate(token).await?;
    let user = users
        .find_user(record.user_id)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    if !user.is_active() {
        return Err(AuthError::Inactive);
    }
    if let Some(required) = required {
        if user.role != required {
            return Err(AuthError::Forbidden { required });
        }
    }

    Ok(Principal {
        user_id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
}

/// Raw bearer token from the `Authorization` header, unvalidated.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;
        Ok(Self(bearer.token().to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let principal = authorize(&state.tokens, state.portfolio.as_ref(), &token, None).await?;
        Ok(Self(principal))
    }
}

pub struct Authorized<R> {
    pub principal: Principal,
    _role: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R: RequiredRole> FromRequestParts<AppState> for Authorized<R> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let principal =
            authorize(&state.tokens, state.portfolio.as_ref(), &token, Some(R::ROLE)).await?;
        Ok(Self {
            principal,
            _role: PhantomData,
        })
    }
}
