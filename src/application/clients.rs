//! Client traits describing the upstream collaborators.
//!
//! The CMS content API and the commerce catalog API are opaque network
//! services; these seams keep the services testable against in-memory
//! fakes and let the HTTP implementations live in `infra::upstream`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ArticleRecord, ProductRecord, TagRecord};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream transport failure: {message}")]
    Transport { message: String },
    #[error("upstream returned status {status}")]
    Status { status: u16 },
    #[error("malformed upstream payload: {message}")]
    Payload { message: String },
}

impl UpstreamError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }
}

/// Read access to the headless CMS content API.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Fetch the complete article collection.
    async fn fetch_articles(&self) -> Result<Vec<ArticleRecord>, UpstreamError>;

    /// Fetch the tag list for a single article.
    async fn fetch_article_tags(&self, slug: &str) -> Result<Vec<TagRecord>, UpstreamError>;

    /// Fetch articles belonging to a category, capped upstream at `limit`.
    async fn fetch_articles_by_category(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, UpstreamError>;
}

/// Read access to the digital-commerce catalog API.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, UpstreamError>;
}
