//! Category derivation service.
//!
//! Categories are not a first-class upstream collection: they are the
//! distinct tags across the cached article set, re-labelled and
//! annotated with article counts and a featured article. Recomputed on
//! every request from the article cache, never cached on their own.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tracing::warn;

use crate::application::articles::ArticleService;
use crate::application::clients::ContentClient;
use crate::application::error::ContentError;
use crate::domain::entities::{ArticleRecord, CategoryRecord};
use crate::domain::error::DomainError;

/// Upstream cap for the related-article list on the category detail view.
const RELATED_ARTICLE_LIMIT: usize = 6;

pub struct CategoryService {
    articles: Arc<ArticleService>,
    content: Arc<dyn ContentClient>,
}

impl CategoryService {
    pub fn new(articles: Arc<ArticleService>, content: Arc<dyn ContentClient>) -> Self {
        Self { articles, content }
    }

    /// Every distinct tag across the cached articles, first-seen order,
    /// each annotated with its article count and a featured article.
    pub async fn all(&self) -> Result<Vec<CategoryRecord>, ContentError> {
        let articles = self.articles.stale_then_refresh().await?;
        if articles.is_empty() {
            return Err(DomainError::not_found("categories").into());
        }
        Ok(derive_categories(&articles))
    }

    /// Categories ordered by article count descending, at most `limit`.
    pub async fn popular(&self, limit: usize) -> Result<Vec<CategoryRecord>, ContentError> {
        let mut categories = self.all().await?;
        categories.sort_by(|a, b| b.article_count.cmp(&a.article_count));
        categories.truncate(limit);
        Ok(categories)
    }

    /// A single derived category plus its related articles.
    ///
    /// Related articles come from the upstream category endpoint; when
    /// that call fails the cached by-tag filter stands in for it.
    pub async fn by_slug(
        &self,
        slug: &str,
    ) -> Result<(CategoryRecord, Vec<ArticleRecord>), ContentError> {
        if slug.trim().is_empty() {
            return Err(DomainError::validation("category slug must not be empty").into());
        }

        let category = self
            .all()
            .await?
            .into_iter()
            .find(|category| category.slug == slug)
            .ok_or(DomainError::not_found("category"))?;

        counter!("brezza_upstream_fetch_total", "collection" => "category_articles").increment(1);
        let related = match self
            .content
            .fetch_articles_by_category(slug, RELATED_ARTICLE_LIMIT)
            .await
        {
            Ok(articles) => articles,
            Err(err) => {
                counter!("brezza_upstream_failure_total", "collection" => "category_articles")
                    .increment(1);
                warn!(
                    error = %err,
                    slug,
                    "Upstream category fetch failed, deriving related articles from cache"
                );
                self.articles
                    .by_tag(slug, RELATED_ARTICLE_LIMIT)
                    .await
                    .unwrap_or_default()
            }
        };

        Ok((category, related))
    }
}

fn derive_categories(articles: &[ArticleRecord]) -> Vec<CategoryRecord> {
    let mut categories: Vec<CategoryRecord> = Vec::new();
    let mut index_by_slug: HashMap<&str, usize> = HashMap::new();

    for article in articles {
        for tag in &article.tags {
            match index_by_slug.get(tag.slug.as_str()) {
                Some(&idx) => categories[idx].article_count += 1,
                None => {
                    index_by_slug.insert(tag.slug.as_str(), categories.len());
                    categories.push(CategoryRecord {
                        slug: tag.slug.clone(),
                        name: tag.name.clone(),
                        color: tag.color.clone(),
                        article_count: 1,
                        featured_article: Some(article.slug.clone()),
                    });
                }
            }
        }
    }

    categories
}
