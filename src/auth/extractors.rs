use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use time::OffsetDateTime;
use tracing::warn;

use super::session::token_from_headers;
use crate::{error::ApiError, schema::User, state::AppState};

/// The session's user; rejects with 401 when there is none.
pub struct AuthUser(pub User);

/// The session's user when there is one. Never rejects for a missing session.
pub struct CurrentUser(pub Option<User>);

async fn lookup(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(token) = token_from_headers(&parts.headers) else {
        return Ok(None);
    };
    let user = state
        .store
        .session_user(&token, OffsetDateTime::now_utc())
        .await?;
    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(lookup(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match lookup(parts, state).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                warn!(method = %parts.method, uri = %parts.uri, "unauthenticated request");
                Err(ApiError::unauthenticated())
            }
        }
    }
}
