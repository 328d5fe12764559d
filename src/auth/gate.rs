use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::{error::AppError, models::user::User, store::Store, AppState};

use super::token::TokenService;

/// Resolves a bearer token to a stored user. Both the token and the user
/// must still be valid; a deleted account invalidates its tokens.
pub async fn authenticate(tokens: &TokenService, store: &Store, token: &str) -> Result<User, AppError> {
    let username = tokens.validate(token)?;

    match store.find_user_by_username(&username).await? {
        Some(user) => Ok(user),
        None => {
            tracing::debug!("Token subject {} no longer exists", username);
            Err(AppError::Unauthorized)
        }
    }
}

/// Extracts `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = authenticate(&state.tokens, &state.store, token).await?;
        Ok(CurrentUser(user))
    }
}
