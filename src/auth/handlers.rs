use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::LoginRequest,
    extractors::CurrentUser,
    password::{hash_password, verify_dummy, verify_password},
    session::{cleared_cookie, start_session, token_from_headers},
};
use crate::{
    error::{ApiError, ApiResult},
    extract::ValidJson,
    schema::{NewUser, PublicUser, ValidationError},
    state::AppState,
    storage::UsernameTaken,
};

type WithCookie<T> = ([(HeaderName, String); 1], T);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user", get(current_user))
}

fn username_taken() -> ApiError {
    ValidationError::new("username", "Username already exists").into()
}

#[instrument(skip_all, fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewUser>,
) -> ApiResult<(StatusCode, WithCookie<Json<PublicUser>>)> {
    if state
        .store
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        warn!("username already registered");
        return Err(username_taken());
    }

    let hash = hash_password(&payload.password)?;
    let user = match state.store.create_user(&payload.username, &hash).await {
        Ok(u) => u,
        // lost a race with a concurrent registration
        Err(e) if e.downcast_ref::<UsernameTaken>().is_some() => return Err(username_taken()),
        Err(e) => return Err(e.into()),
    };

    let cookie = start_session(&state, user.id).await?;
    info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        ([(SET_COOKIE, cookie)], Json(user.into())),
    ))
}

#[instrument(skip_all, fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<WithCookie<Json<PublicUser>>> {
    let invalid = || ApiError::Unauthorized("Invalid username or password".into());

    let Some(user) = state
        .store
        .get_user_by_username(&payload.username)
        .await?
    else {
        verify_dummy(&payload.password);
        warn!("login unknown username");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }

    let cookie = start_session(&state, user.id).await?;
    info!(user_id = user.id, "user logged in");
    Ok(([(SET_COOKIE, cookie)], Json(user.into())))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<WithCookie<StatusCode>> {
    if let Some(token) = token_from_headers(&headers) {
        state.store.delete_session(&token).await?;
        info!("session ended");
    }
    Ok((
        [(SET_COOKIE, cleared_cookie(&state.config.session))],
        StatusCode::OK,
    ))
}

#[instrument(skip_all)]
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<Option<PublicUser>> {
    Json(user.map(PublicUser::from))
}
