use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;
use tracing::warn;

use crate::{
    error::ApiError,
    schema::{Validate, ValidationError},
};

/// JSON body that has passed its schema rules.
///
/// A body that is not JSON becomes a plain 400. A missing or mistyped field,
/// like a rule violation, becomes a 400 naming the field.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rej| {
                warn!(error = %rej.body_text(), "rejected request body");
                ApiError::BadRequest("Request body must be valid JSON".into())
            })?;

        let value: T = serde_path_to_error::deserialize(raw).map_err(|e| {
            warn!(path = %e.path(), error = %e.inner(), "body does not match form");
            match decode_error::<T>(&e) {
                Some(err) => ApiError::from(err),
                None => ApiError::BadRequest("Request body has the wrong shape".into()),
            }
        })?;

        if let Err(e) = value.validate() {
            warn!(field = e.field, message = %e.message, "validation failed");
            return Err(e.into());
        }
        Ok(ValidJson(value))
    }
}

/// Names the form field a decode error is about, if it is one of `T`'s.
fn decode_error<T: Validate>(
    err: &serde_path_to_error::Error<serde_json::Error>,
) -> Option<ValidationError> {
    let (name, missing) = match err.path().iter().next() {
        Some(Segment::Map { key }) => (key.clone(), false),
        Some(_) => return None,
        None => {
            let msg = err.inner().to_string();
            let name = msg.strip_prefix("missing field `")?.split('`').next()?.to_owned();
            (name, true)
        }
    };
    let field = T::FIELDS.iter().copied().find(|f| *f == name)?;
    let label = capitalize(field);
    let message = if missing {
        format!("{label} is required")
    } else {
        format!("{label} has an invalid value")
    };
    Some(ValidationError::new(field, message))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
