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
    schema::{NewProduct, Product},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", delete(delete_product))
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.store.list_products().await?))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(new): ValidJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.store.create_product(new, user.id).await?;
    info!(product_id = product.id, "product listed");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip_all, fields(user_id = user.id, id = id))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
    let owner = state.store.get_product(id).await?.map(|p| p.seller_id);
    check_owner(owner, user.id, "Product")?;
    if !state.store.delete_product(id).await? {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    info!(product_id = id, "product deleted");
    Ok(StatusCode::OK)
}
