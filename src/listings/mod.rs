//! Products, jobs and service requests: list, create and delete.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    Router,
};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

pub mod jobs;
pub mod products;
pub mod requests;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(jobs::router())
        .merge(requests::router())
}

/// Integer `:id` path segment; anything else is a 400 with a JSON body.
pub struct RecordId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Invalid id".into()))?;
        Ok(RecordId(id))
    }
}

/// Only the user who posted a record may delete it.
pub(crate) fn check_owner(
    owner_id: Option<i32>,
    caller_id: i32,
    kind: &str,
) -> Result<(), ApiError> {
    match owner_id {
        None => Err(ApiError::NotFound(format!("{kind} not found"))),
        Some(owner) if owner != caller_id => {
            warn!(owner, caller_id, "delete refused, caller is not the owner");
            Err(ApiError::Forbidden(format!(
                "You can only delete your own {}s",
                kind.to_lowercase()
            )))
        }
        Some(_) => Ok(()),
    }
}
