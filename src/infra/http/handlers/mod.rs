//! Route handlers. Thin: translate query parameters, call the services,
//! wrap the result in the uniform envelope with the route's cache header.

mod articles;
mod categories;
mod products;

pub use articles::{
    article_tags, articles_by_tag, latest_articles, list_articles, trending_articles,
};
pub use categories::{category_by_slug, list_categories, popular_categories};
pub use products::list_products;

use axum::http::StatusCode;

use crate::application::error::ContentError;
use crate::domain::error::DomainError;

use super::error::ApiError;

pub async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Classify a service failure into the envelope taxonomy: validation →
/// 400, legitimately absent → 404, upstream with no stale data → 500.
pub(crate) fn content_error_to_api(err: ContentError) -> ApiError {
    match err {
        ContentError::Domain(DomainError::NotFound { entity }) => {
            ApiError::not_found(not_found_message(entity))
        }
        ContentError::Domain(DomainError::Validation { message }) => ApiError::bad_request(message),
        ContentError::Upstream(err) => {
            ApiError::upstream_unavailable().with_detail(err.to_string())
        }
    }
}

fn not_found_message(entity: &'static str) -> &'static str {
    match entity {
        "category" => "Category not found",
        "categories" => "No categories found",
        "articles" => "No articles found",
        "tag" => "No articles found for tag",
        _ => "Resource not found",
    }
}
