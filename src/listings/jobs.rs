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
    schema::{Job, NewJob},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", delete(delete_job))
}

#[instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.store.list_jobs().await?))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(new): ValidJson<NewJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let job = state.store.create_job(new, user.id).await?;
    info!(job_id = job.id, "job posted");
    Ok((StatusCode::CREATED, Json(job)))
}

#[instrument(skip_all, fields(user_id = user.id, id = id))]
pub async fn delete_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
    let owner = state.store.get_job(id).await?.map(|j| j.employer_id);
    check_owner(owner, user.id, "Job")?;
    if !state.store.delete_job(id).await? {
        return Err(ApiError::NotFound("Job not found".into()));
    }
    info!(job_id = id, "job deleted");
    Ok(StatusCode::OK)
}
