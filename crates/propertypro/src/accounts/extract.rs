use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::domain::User;
use super::service::{AccountError, AccountService};
use crate::error::AppError;

/// The user resolved from the request's `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Rejects non-admin callers with "Not authorized to <action>".
    pub fn require_admin(&self, action: &'static str) -> Result<&User, AccountError> {
        if self.0.is_admin() {
            Ok(&self.0)
        } else {
            Err(AccountError::NotAuthorized(action))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<AccountService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AccountError::MissingToken)?;
        let accounts = Arc::<AccountService>::from_ref(state);
        let user = accounts.authenticate(token).await?;
        Ok(Self(user))
    }
}
