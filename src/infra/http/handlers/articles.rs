use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;

use crate::infra::http::HttpState;
use crate::infra::http::error::ApiError;
use crate::infra::http::headers::{
    ARTICLE_TAGS_MAX_AGE, ARTICLES_BY_TAG_MAX_AGE, ARTICLES_MAX_AGE, LATEST_MAX_AGE,
    TRENDING_MAX_AGE, cache_control,
};
use crate::infra::http::models::{ArticleListQuery, Envelope, LimitQuery, clamp_limit};

use super::content_error_to_api;

/// `GET /articles` — full cached list, optionally force-refreshed.
pub async fn list_articles(
    State(state): State<HttpState>,
    Query(query): Query<ArticleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit);
    let force = query.force.unwrap_or(false);

    let articles = state
        .articles
        .cached_or_fetch(force)
        .await
        .map_err(content_error_to_api)?;

    let total = articles.len();
    let page: Vec<_> = articles.into_iter().take(limit).collect();
    let count = page.len();

    Ok((
        cache_control(ARTICLES_MAX_AGE),
        Json(Envelope::truncated(page, count, total)),
    ))
}

/// `GET /articles/latest` — sorted by publish date descending.
pub async fn latest_articles(
    State(state): State<HttpState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit);

    let articles = state
        .articles
        .latest(limit)
        .await
        .map_err(content_error_to_api)?;

    let count = articles.len();
    Ok((
        cache_control(LATEST_MAX_AGE),
        Json(Envelope::list(articles, count)),
    ))
}

/// `GET /articles/trending` — sorted by engagement with jitter.
pub async fn trending_articles(
    State(state): State<HttpState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit);

    let articles = state
        .articles
        .trending(limit)
        .await
        .map_err(content_error_to_api)?;

    let count = articles.len();
    Ok((
        cache_control(TRENDING_MAX_AGE),
        Json(Envelope::list(articles, count)),
    ))
}

/// `GET /articles/tag/{slug}` — filtered by tag, original order.
pub async fn articles_by_tag(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit);

    let articles = state
        .articles
        .by_tag(&slug, limit)
        .await
        .map_err(content_error_to_api)?;

    let count = articles.len();
    Ok((
        cache_control(ARTICLES_BY_TAG_MAX_AGE),
        Json(Envelope::list(articles, count)),
    ))
}

/// `GET /articles/{slug}/tags` — per-article tag list.
pub async fn article_tags(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = state
        .articles
        .tags_for(&slug)
        .await
        .map_err(content_error_to_api)?;

    Ok((cache_control(ARTICLE_TAGS_MAX_AGE), Json(Envelope::new(tags))))
}
