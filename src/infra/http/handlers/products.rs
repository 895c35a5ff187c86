use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::infra::http::HttpState;
use crate::infra::http::error::ApiError;
use crate::infra::http::headers::{PRODUCTS_MAX_AGE, cache_control};
use crate::infra::http::models::Envelope;

use super::content_error_to_api;

/// `GET /products` — cached commerce catalog listing.
pub async fn list_products(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .products
        .list()
        .await
        .map_err(content_error_to_api)?;

    let count = products.len();
    Ok((
        cache_control(PRODUCTS_MAX_AGE),
        Json(Envelope::list(products, count)),
    ))
}
