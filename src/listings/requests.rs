use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};

use super::{check_owner, RecordId};
use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::ValidJson,
    schema::{NewServiceRequest, ServiceRequest},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/:id", delete(delete_request))
}

#[instrument(skip(state))]
pub async fn list_requests(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ServiceRequest>>> {
    Ok(Json(state.store.list_requests().await?))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(new): ValidJson<NewServiceRequest>,
) -> ApiResult<(StatusCode, Json<ServiceRequest>)> {
    let request = state.store.create_request(new, user.id).await?;
    info!(request_id = request.id, "request posted");
    Ok((StatusCode::CREATED, Json(request)))
}

#[instrument(skip_all, fields(user_id = user.id, id = id))]
pub async fn delete_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
    let owner = state.store.get_request(id).await?.map(|r| r.requester_id);
    check_owner(owner, user.id, "Request")?;
    if !state.store.delete_request(id).await? {
        return Err(ApiError::NotFound("Request not found".into()));
    }
    info!(request_id = id, "request deleted");
    Ok(StatusCode::OK)
}
