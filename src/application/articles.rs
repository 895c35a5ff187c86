//! Article aggregation service.
//!
//! Owns the full-article cache slot and computes every derived view
//! (by-tag, latest, trending, per-article tags) as a pure projection of
//! the cached set. Derived views are never cached on their own, so they
//! cannot go stale independently of the underlying article list.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::clients::ContentClient;
use crate::application::error::ContentError;
use crate::cache::CacheStore;
use crate::config::CacheSettings;
use crate::domain::entities::{ArticleRecord, TagRecord};
use crate::domain::error::DomainError;

/// Articles published within this many days count as new.
const NEW_ARTICLE_WINDOW_DAYS: i64 = 7;

/// Adjacent trending entries whose view counts differ by less than this
/// fraction of the larger count may swap order between calls.
const TRENDING_JITTER_BAND: f64 = 0.20;

const LIKE_WEIGHT: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct LatestArticle {
    #[serde(flatten)]
    pub article: ArticleRecord,
    pub is_new: bool,
    pub days_since_published: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingArticle {
    #[serde(flatten)]
    pub article: ArticleRecord,
    pub trending_score: f64,
    pub is_trending: bool,
}

pub struct ArticleService {
    content: Arc<dyn ContentClient>,
    store: Arc<CacheStore>,
    article_ttl: Duration,
    tag_ttl: Duration,
}

impl ArticleService {
    pub fn new(
        content: Arc<dyn ContentClient>,
        store: Arc<CacheStore>,
        settings: &CacheSettings,
    ) -> Self {
        Self {
            content,
            store,
            article_ttl: settings.article_ttl,
            tag_ttl: settings.tag_ttl,
        }
    }

    /// Return the full article list, fetching upstream when the cache
    /// misses, is expired, or `force` is set.
    ///
    /// On upstream failure any previously cached list is served stale
    /// instead; the error surfaces only when no prior data exists.
    pub async fn cached_or_fetch(&self, force: bool) -> Result<Vec<ArticleRecord>, ContentError> {
        if !force {
            if let Some(articles) = self.store.get_articles() {
                return Ok(articles);
            }
        }

        counter!("brezza_upstream_fetch_total", "collection" => "articles").increment(1);
        match self.content.fetch_articles().await {
            Ok(articles) => {
                self.store.set_articles(articles.clone(), self.article_ttl);
                Ok(articles)
            }
            Err(err) => {
                counter!("brezza_upstream_failure_total", "collection" => "articles").increment(1);
                match self.store.get_articles_stale() {
                    Some(stale) => {
                        counter!("brezza_cache_stale_serve_total", "slot" => "articles")
                            .increment(1);
                        warn!(
                            error = %err,
                            articles = stale.len(),
                            "Upstream fetch failed, serving stale article list"
                        );
                        Ok(stale)
                    }
                    None => Err(ContentError::Upstream(err)),
                }
            }
        }
    }

    /// Two-path read for the derived routes: a fresh entry returns
    /// directly, an expired one is served stale while a detached task
    /// refreshes it, and a total miss falls back to a synchronous fetch.
    pub async fn stale_then_refresh(&self) -> Result<Vec<ArticleRecord>, ContentError> {
        if let Some(articles) = self.store.get_articles() {
            return Ok(articles);
        }

        if let Some(stale) = self.store.get_articles_stale() {
            counter!("brezza_cache_stale_serve_total", "slot" => "articles").increment(1);
            let content = Arc::clone(&self.content);
            let store = Arc::clone(&self.store);
            let ttl = self.article_ttl;
            tokio::spawn(async move {
                counter!("brezza_upstream_fetch_total", "collection" => "articles").increment(1);
                match content.fetch_articles().await {
                    Ok(articles) => store.set_articles(articles, ttl),
                    Err(err) => {
                        counter!("brezza_upstream_failure_total", "collection" => "articles")
                            .increment(1);
                        warn!(error = %err, "Background article refresh failed");
                    }
                }
            });
            return Ok(stale);
        }

        self.cached_or_fetch(true).await
    }

    /// Articles carrying the given tag, in original order, at most `limit`.
    pub async fn by_tag(
        &self,
        tag_slug: &str,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, ContentError> {
        if tag_slug.trim().is_empty() {
            return Err(DomainError::validation("tag slug must not be empty").into());
        }

        let articles = self.stale_then_refresh().await?;
        let matched: Vec<ArticleRecord> = articles
            .into_iter()
            .filter(|article| article.has_tag(tag_slug))
            .take(limit)
            .collect();

        if matched.is_empty() {
            return Err(DomainError::not_found("tag").into());
        }
        Ok(matched)
    }

    /// Most recently published articles, annotated with recency data.
    pub async fn latest(
        &self,
        limit: usize,
    ) -> Result<Vec<LatestArticle>, ContentError> {
        let mut articles = self.stale_then_refresh().await?;
        if articles.is_empty() {
            return Err(DomainError::not_found("articles").into());
        }

        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        let now = OffsetDateTime::now_utc();

        Ok(articles
            .into_iter()
            .take(limit)
            .map(|article| annotate_latest(article, now))
            .collect())
    }

    /// Highest-engagement articles. Strictly ordered by view count except
    /// within the jitter band, where adjacent entries may swap per call.
    pub async fn trending(
        &self,
        limit: usize,
    ) -> Result<Vec<TrendingArticle>, ContentError> {
        let articles = self.stale_then_refresh().await?;
        if articles.is_empty() {
            return Err(DomainError::not_found("articles").into());
        }

        Ok(rank_trending(articles, limit, &mut rand::thread_rng()))
    }

    /// Tag list for a single article, cached per slug.
    pub async fn tags_for(&self, article_slug: &str) -> Result<Vec<TagRecord>, ContentError> {
        if article_slug.trim().is_empty() {
            return Err(DomainError::validation("article slug must not be empty").into());
        }

        if let Some(tags) = self.store.get_article_tags(article_slug) {
            return Ok(tags);
        }

        counter!("brezza_upstream_fetch_total", "collection" => "article_tags").increment(1);
        match self.content.fetch_article_tags(article_slug).await {
            Ok(tags) => {
                self.store
                    .set_article_tags(article_slug, tags.clone(), self.tag_ttl);
                Ok(tags)
            }
            Err(err) => {
                counter!("brezza_upstream_failure_total", "collection" => "article_tags")
                    .increment(1);
                match self.store.get_article_tags_stale(article_slug) {
                    Some(stale) => {
                        counter!("brezza_cache_stale_serve_total", "slot" => "article_tags")
                            .increment(1);
                        warn!(
                            error = %err,
                            slug = article_slug,
                            "Upstream tag fetch failed, serving stale tag list"
                        );
                        Ok(stale)
                    }
                    None => Err(ContentError::Upstream(err)),
                }
            }
        }
    }
}

fn annotate_latest(article: ArticleRecord, now: OffsetDateTime) -> LatestArticle {
    let days_since_published = (now - article.published_at).whole_days();
    LatestArticle {
        is_new: days_since_published < NEW_ARTICLE_WINDOW_DAYS,
        days_since_published,
        article,
    }
}

pub fn trending_score(views: u64, likes: u64) -> f64 {
    (views + likes * LIKE_WEIGHT) as f64 / 100.0
}

/// True when two view counts are close enough that their relative order
/// is allowed to vary between calls.
fn within_jitter_band(a: u64, b: u64) -> bool {
    let larger = a.max(b);
    if larger == 0 {
        return true;
    }
    (a.abs_diff(b) as f64) < larger as f64 * TRENDING_JITTER_BAND
}

fn rank_trending<R: Rng>(
    mut articles: Vec<ArticleRecord>,
    limit: usize,
    rng: &mut R,
) -> Vec<TrendingArticle> {
    articles.sort_by(|a, b| b.views.cmp(&a.views).then(b.likes.cmp(&a.likes)));

    // Single adjacent-swap pass. Every swap is band-checked pairwise, so
    // any pair outside the band keeps its strict view-count order.
    for i in 1..articles.len() {
        if within_jitter_band(articles[i - 1].views, articles[i].views) && rng.gen_bool(0.5) {
            articles.swap(i - 1, i);
        }
    }

    articles
        .into_iter()
        .take(limit)
        .map(|article| TrendingArticle {
            trending_score: trending_score(article.views, article.likes),
            is_trending: true,
            article,
        })
        .collect()
}
