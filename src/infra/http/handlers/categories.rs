use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::entities::{ArticleRecord, CategoryRecord};
use crate::infra::http::HttpState;
use crate::infra::http::error::ApiError;
use crate::infra::http::headers::{
    CATEGORIES_MAX_AGE, CATEGORY_MAX_AGE, POPULAR_CATEGORIES_MAX_AGE, cache_control,
};
use crate::infra::http::models::{Envelope, LimitQuery, clamp_limit};

use super::content_error_to_api;

#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: CategoryRecord,
    pub related_articles: Vec<ArticleRecord>,
}

/// `GET /categories` — every tag re-labelled as a category.
pub async fn list_categories(
    State(state): State<HttpState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .categories
        .all()
        .await
        .map_err(content_error_to_api)?;

    let count = categories.len();
    Ok((
        cache_control(CATEGORIES_MAX_AGE),
        Json(Envelope::list(categories, count)),
    ))
}

/// `GET /categories/popular` — ordered by article count.
pub async fn popular_categories(
    State(state): State<HttpState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit);

    let categories = state
        .categories
        .popular(limit)
        .await
        .map_err(content_error_to_api)?;

    let count = categories.len();
    Ok((
        cache_control(POPULAR_CATEGORIES_MAX_AGE),
        Json(Envelope::list(categories, count)),
    ))
}

/// `GET /categories/{slug}` — single category plus related articles.
pub async fn category_by_slug(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (category, related_articles) = state
        .categories
        .by_slug(&slug)
        .await
        .map_err(content_error_to_api)?;

    Ok((
        cache_control(CATEGORY_MAX_AGE),
        Json(Envelope::new(CategoryDetail {
            category,
            related_articles,
        })),
    ))
}
