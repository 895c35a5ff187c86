//! Service-level cache semantics: fetch idempotence inside the TTL
//! window, force refresh, stale fallback, and derived-view properties.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;

use brezza::application::articles::ArticleService;
use brezza::application::clients::{CatalogClient, ContentClient, UpstreamError};
use brezza::application::error::ContentError;
use brezza::application::products::ProductService;
use brezza::cache::CacheStore;
use brezza::config::CacheSettings;
use brezza::domain::entities::{ArticleRecord, ProductRecord, TagRecord};

struct FakeContent {
    articles: Vec<ArticleRecord>,
    fail: bool,
    article_calls: AtomicUsize,
    tag_calls: AtomicUsize,
}

impl FakeContent {
    fn serving(articles: Vec<ArticleRecord>) -> Arc<Self> {
        Arc::new(Self {
            articles,
            fail: false,
            article_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            articles: Vec::new(),
            fail: true,
            article_calls: AtomicUsize::new(0),
            tag_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ContentClient for FakeContent {
    async fn fetch_articles(&self) -> Result<Vec<ArticleRecord>, UpstreamError> {
        self.article_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::transport("connection refused"));
        }
        Ok(self.articles.clone())
    }

    async fn fetch_article_tags(&self, _slug: &str) -> Result<Vec<TagRecord>, UpstreamError> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::transport("connection refused"));
        }
        Ok(vec![tag("rust")])
    }

    async fn fetch_articles_by_category(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, UpstreamError> {
        if self.fail {
            return Err(UpstreamError::transport("connection refused"));
        }
        Ok(self
            .articles
            .iter()
            .filter(|article| article.has_tag(slug))
            .take(limit)
            .cloned()
            .collect())
    }
}

struct FakeCatalog {
    products: Vec<ProductRecord>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeCatalog {
    fn serving(products: Vec<ProductRecord>) -> Arc<Self> {
        Arc::new(Self {
            products,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            products: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::transport("connection refused"));
        }
        Ok(self.products.clone())
    }
}

fn product(slug: &str) -> ProductRecord {
    ProductRecord {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        price_cents: 1999,
        currency: "USD".to_string(),
        cover_image: None,
    }
}

fn tag(slug: &str) -> TagRecord {
    TagRecord {
        id: format!("tag-{slug}"),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        color: None,
    }
}

fn article(slug: &str, published_at: OffsetDateTime, tags: Vec<TagRecord>) -> ArticleRecord {
    ArticleRecord {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        title: slug.to_uppercase(),
        brief: String::new(),
        cover_image: None,
        published_at,
        tags,
        views: 100,
        likes: 0,
    }
}

fn sample_set() -> Vec<ArticleRecord> {
    vec![
        article("alpha", datetime!(2024-03-01 00:00 UTC), vec![tag("rust")]),
        article("beta", datetime!(2024-03-10 00:00 UTC), vec![tag("web")]),
        article(
            "gamma",
            datetime!(2024-03-05 00:00 UTC),
            vec![tag("rust"), tag("web")],
        ),
    ]
}

fn service_with(content: Arc<FakeContent>) -> Arc<ArticleService> {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));
    Arc::new(ArticleService::new(content, store, &settings))
}

fn service_with_store(content: Arc<FakeContent>, store: Arc<CacheStore>) -> Arc<ArticleService> {
    let settings = CacheSettings::default();
    Arc::new(ArticleService::new(content, store, &settings))
}

#[tokio::test]
async fn second_fetch_inside_the_ttl_window_hits_the_cache() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(Arc::clone(&content));

    let first = service.cached_or_fetch(false).await.expect("first fetch");
    let second = service.cached_or_fetch(false).await.expect("second fetch");

    assert_eq!(first, second);
    assert_eq!(content.article_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn force_refresh_always_goes_upstream() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(Arc::clone(&content));

    service.cached_or_fetch(false).await.expect("warm");
    service.cached_or_fetch(true).await.expect("forced");

    assert_eq!(content.article_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn upstream_failure_serves_stale_data() {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));
    store.set_articles(sample_set(), Duration::ZERO);
    std::thread::sleep(Duration::from_millis(2));

    let content = FakeContent::failing();
    let service = service_with_store(Arc::clone(&content), store);

    let articles = service
        .cached_or_fetch(false)
        .await
        .expect("stale fallback");
    assert_eq!(articles.len(), 3);
    assert_eq!(content.article_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn upstream_failure_with_no_prior_data_surfaces_the_error() {
    let content = FakeContent::failing();
    let service = service_with(content);

    let result = service.cached_or_fetch(false).await;
    assert!(matches!(result, Err(ContentError::Upstream(_))));
}

#[tokio::test]
async fn stale_then_refresh_returns_old_data_and_refreshes_in_background() {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));

    let mut expired = sample_set();
    expired.truncate(1);
    store.set_articles(expired, Duration::ZERO);
    std::thread::sleep(Duration::from_millis(2));

    let content = FakeContent::serving(sample_set());
    let service = service_with_store(Arc::clone(&content), Arc::clone(&store));

    let served = service.stale_then_refresh().await.expect("stale read");
    assert_eq!(served.len(), 1);

    // The detached refresh replaces the entry shortly after.
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if store.get_articles().is_some() {
            break;
        }
    }
    assert_eq!(store.get_articles().expect("refreshed").len(), 3);
    assert_eq!(content.article_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn by_tag_preserves_order_and_respects_limit() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(content);

    let matched = service.by_tag("rust", 10).await.expect("matches");
    let slugs: Vec<&str> = matched.iter().map(|a| a.slug.as_str()).collect();
    assert_eq!(slugs, ["alpha", "gamma"]);

    let capped = service.by_tag("rust", 1).await.expect("capped");
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].slug, "alpha");
}

#[tokio::test]
async fn by_tag_with_empty_slug_is_a_validation_error() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(content);

    let result = service.by_tag("  ", 10).await;
    assert!(matches!(result, Err(ContentError::Domain(_))));
}

#[tokio::test]
async fn by_tag_without_matches_reads_as_not_found() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(content);

    let result = service.by_tag("nonexistent", 10).await;
    assert!(matches!(result, Err(ContentError::Domain(_))));
}

#[tokio::test]
async fn latest_sorts_by_publish_date_descending() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(content);

    let latest = service.latest(10).await.expect("latest");
    let slugs: Vec<&str> = latest.iter().map(|a| a.article.slug.as_str()).collect();
    assert_eq!(slugs, ["beta", "gamma", "alpha"]);
    assert!(
        latest
            .iter()
            .all(|item| item.is_new == (item.days_since_published < 7))
    );
}

#[tokio::test]
async fn latest_on_empty_upstream_is_not_found() {
    let content = FakeContent::serving(Vec::new());
    let service = service_with(content);

    let result = service.latest(10).await;
    assert!(matches!(result, Err(ContentError::Domain(_))));
}

#[tokio::test]
async fn trending_orders_strictly_outside_the_jitter_band() {
    let mut articles = sample_set();
    articles[0].views = 10_000;
    articles[1].views = 1_000;
    articles[2].views = 10;
    let content = FakeContent::serving(articles);
    let service = service_with(content);

    for _ in 0..20 {
        let trending = service.trending(10).await.expect("trending");
        let slugs: Vec<&str> = trending.iter().map(|t| t.article.slug.as_str()).collect();
        assert_eq!(slugs, ["alpha", "beta", "gamma"]);
        assert!(trending.iter().all(|t| t.is_trending));
    }
}

#[tokio::test]
async fn catalog_failure_serves_stale_products() {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));
    store.set_products(vec![product("ebook")], Duration::ZERO);
    std::thread::sleep(Duration::from_millis(2));

    let catalog = FakeCatalog::failing();
    let service =
        ProductService::new(Arc::clone(&catalog) as Arc<dyn CatalogClient>, store, &settings);

    let products = service.list().await.expect("stale fallback");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].slug, "ebook");
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn catalog_failure_with_no_prior_data_surfaces_the_error() {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));
    let service = ProductService::new(FakeCatalog::failing(), store, &settings);

    let result = service.list().await;
    assert!(matches!(result, Err(ContentError::Upstream(_))));
}

#[tokio::test]
async fn second_product_listing_inside_the_ttl_window_hits_the_cache() {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));
    let catalog = FakeCatalog::serving(vec![product("ebook")]);
    let service =
        ProductService::new(Arc::clone(&catalog) as Arc<dyn CatalogClient>, store, &settings);

    let first = service.list().await.expect("first listing");
    let second = service.list().await.expect("second listing");

    assert_eq!(first, second);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn tag_fetch_failure_serves_stale_tag_list() {
    let settings = CacheSettings::default();
    let store = Arc::new(CacheStore::new(&settings));
    store.set_article_tags("alpha", vec![tag("web")], Duration::ZERO);
    std::thread::sleep(Duration::from_millis(2));

    let content = FakeContent::failing();
    let service = service_with_store(Arc::clone(&content), store);

    let tags = service.tags_for("alpha").await.expect("stale fallback");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].slug, "web");
    assert_eq!(content.tag_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn tag_fetch_failure_with_no_prior_entry_surfaces_the_error() {
    let content = FakeContent::failing();
    let service = service_with(content);

    let result = service.tags_for("alpha").await;
    assert!(matches!(result, Err(ContentError::Upstream(_))));
}

#[tokio::test]
async fn tags_for_with_empty_slug_is_a_validation_error() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(Arc::clone(&content));

    let result = service.tags_for("  ").await;
    assert!(matches!(result, Err(ContentError::Domain(_))));
    assert_eq!(content.tag_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn article_tags_are_cached_per_slug() {
    let content = FakeContent::serving(sample_set());
    let service = service_with(Arc::clone(&content));

    let first = service.tags_for("alpha").await.expect("first");
    let second = service.tags_for("alpha").await.expect("second");

    assert_eq!(first, second);
    assert_eq!(content.tag_calls.load(Ordering::SeqCst), 1);

    service.tags_for("beta").await.expect("other slug");
    assert_eq!(content.tag_calls.load(Ordering::SeqCst), 2);
}
