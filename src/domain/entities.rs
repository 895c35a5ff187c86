//! Domain records mirrored from the upstream content and catalog APIs.
//!
//! All records are owned upstream; this service only reads and derives
//! from them. Identifiers are the upstream's opaque string ids.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub brief: String,
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub tags: Vec<TagRecord>,
    pub views: u64,
    pub likes: u64,
}

impl ArticleRecord {
    /// True when any of the article's tags carries the given slug.
    pub fn has_tag(&self, slug: &str) -> bool {
        self.tags.iter().any(|tag| tag.slug == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub color: Option<String>,
}

/// A tag re-labelled as a category, annotated with article data derived
/// from the cached article set. Never produced with a zero article count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub slug: String,
    pub name: String,
    pub color: Option<String>,
    pub article_count: usize,
    pub featured_article: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub price_cents: u64,
    pub currency: String,
    pub cover_image: Option<String>,
}
