pub mod error;
pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::articles::ArticleService;
use crate::application::categories::CategoryService;
use crate::application::products::ProductService;

#[derive(Clone)]
pub struct HttpState {
    pub articles: Arc<ArticleService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/articles", get(handlers::list_articles))
        .route("/articles/latest", get(handlers::latest_articles))
        .route("/articles/trending", get(handlers::trending_articles))
        .route("/articles/tag/{slug}", get(handlers::articles_by_tag))
        .route("/articles/{slug}/tags", get(handlers::article_tags))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/popular", get(handlers::popular_categories))
        .route("/categories/{slug}", get(handlers::category_by_slug))
        .route("/products", get(handlers::list_products))
        .route("/healthz", get(handlers::healthz))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}
