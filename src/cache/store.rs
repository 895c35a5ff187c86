//! Typed TTL cache storage.
//!
//! One singleton slot per upstream collection plus an LRU-bounded keyed
//! cache for per-article tag lists. The store is constructed once at
//! process start and shared behind an `Arc`; services are the only
//! writers, handlers read through them. Concurrent writers are not
//! coordinated: the last `set` wins.

use std::sync::RwLock;
use std::time::Duration;

use lru::LruCache;
use metrics::counter;

use crate::config::CacheSettings;
use crate::domain::entities::{ArticleRecord, ProductRecord, TagRecord};

use super::entry::CacheEntry;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub struct CacheStore {
    articles: RwLock<Option<CacheEntry<Vec<ArticleRecord>>>>,
    products: RwLock<Option<CacheEntry<Vec<ProductRecord>>>>,
    tags_by_article: RwLock<LruCache<String, CacheEntry<Vec<TagRecord>>>>,
}

impl CacheStore {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            articles: RwLock::new(None),
            products: RwLock::new(None),
            tags_by_article: RwLock::new(LruCache::new(settings.tag_list_limit_non_zero())),
        }
    }

    // ========================================================================
    // Article list slot
    // ========================================================================

    /// Strict read: returns the article list only while the entry is fresh.
    pub fn get_articles(&self) -> Option<Vec<ArticleRecord>> {
        let guard = rw_read(&self.articles, SOURCE, "get_articles");
        match guard.as_ref() {
            Some(entry) if entry.is_fresh() => {
                counter!("brezza_cache_hit_total", "slot" => "articles").increment(1);
                Some(entry.value().clone())
            }
            _ => {
                counter!("brezza_cache_miss_total", "slot" => "articles").increment(1);
                None
            }
        }
    }

    /// Stale-tolerant read: returns whatever entry is present, expired or not.
    pub fn get_articles_stale(&self) -> Option<Vec<ArticleRecord>> {
        rw_read(&self.articles, SOURCE, "get_articles_stale")
            .as_ref()
            .map(|entry| entry.value().clone())
    }

    pub fn set_articles(&self, articles: Vec<ArticleRecord>, ttl: Duration) {
        *rw_write(&self.articles, SOURCE, "set_articles") = Some(CacheEntry::new(articles, ttl));
    }

    pub fn invalidate_articles(&self) {
        *rw_write(&self.articles, SOURCE, "invalidate_articles") = None;
    }

    // ========================================================================
    // Product list slot
    // ========================================================================

    pub fn get_products(&self) -> Option<Vec<ProductRecord>> {
        let guard = rw_read(&self.products, SOURCE, "get_products");
        match guard.as_ref() {
            Some(entry) if entry.is_fresh() => {
                counter!("brezza_cache_hit_total", "slot" => "products").increment(1);
                Some(entry.value().clone())
            }
            _ => {
                counter!("brezza_cache_miss_total", "slot" => "products").increment(1);
                None
            }
        }
    }

    pub fn get_products_stale(&self) -> Option<Vec<ProductRecord>> {
        rw_read(&self.products, SOURCE, "get_products_stale")
            .as_ref()
            .map(|entry| entry.value().clone())
    }

    pub fn set_products(&self, products: Vec<ProductRecord>, ttl: Duration) {
        *rw_write(&self.products, SOURCE, "set_products") = Some(CacheEntry::new(products, ttl));
    }

    pub fn invalidate_products(&self) {
        *rw_write(&self.products, SOURCE, "invalidate_products") = None;
    }

    // ========================================================================
    // Per-article tag lists (keyed, LRU-bounded)
    // ========================================================================

    pub fn get_article_tags(&self, slug: &str) -> Option<Vec<TagRecord>> {
        let mut guard = rw_write(&self.tags_by_article, SOURCE, "get_article_tags");
        match guard.get(slug) {
            Some(entry) if entry.is_fresh() => {
                counter!("brezza_cache_hit_total", "slot" => "article_tags").increment(1);
                Some(entry.value().clone())
            }
            _ => {
                counter!("brezza_cache_miss_total", "slot" => "article_tags").increment(1);
                None
            }
        }
    }

    pub fn get_article_tags_stale(&self, slug: &str) -> Option<Vec<TagRecord>> {
        rw_write(&self.tags_by_article, SOURCE, "get_article_tags_stale")
            .get(slug)
            .map(|entry| entry.value().clone())
    }

    pub fn set_article_tags(&self, slug: &str, tags: Vec<TagRecord>, ttl: Duration) {
        rw_write(&self.tags_by_article, SOURCE, "set_article_tags")
            .put(slug.to_string(), CacheEntry::new(tags, ttl));
    }

    pub fn invalidate_article_tags(&self, slug: &str) {
        rw_write(&self.tags_by_article, SOURCE, "invalidate_article_tags").pop(slug);
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.invalidate_articles();
        self.invalidate_products();
        rw_write(&self.tags_by_article, SOURCE, "clear.tags_by_article").clear();
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::macros::datetime;

    use super::*;

    fn sample_article(slug: &str) -> ArticleRecord {
        ArticleRecord {
            id: format!("id-{slug}"),
            slug: slug.to_string(),
            title: "Test Article".to_string(),
            brief: String::new(),
            cover_image: None,
            published_at: datetime!(2024-01-15 12:00 UTC),
            tags: Vec::new(),
            views: 0,
            likes: 0,
        }
    }

    fn sample_tag(slug: &str) -> TagRecord {
        TagRecord {
            id: format!("tag-{slug}"),
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            color: None,
        }
    }

    fn settings_with_tag_limit(limit: usize) -> CacheSettings {
        CacheSettings {
            tag_list_limit: limit,
            ..CacheSettings::default()
        }
    }

    #[test]
    fn article_slot_roundtrip() {
        let store = CacheStore::new(&CacheSettings::default());

        assert!(store.get_articles().is_none());

        store.set_articles(vec![sample_article("one")], Duration::from_secs(300));

        let cached = store.get_articles().expect("cached articles");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].slug, "one");

        store.invalidate_articles();
        assert!(store.get_articles().is_none());
        assert!(store.get_articles_stale().is_none());
    }

    #[test]
    fn expired_article_entry_misses_strict_but_serves_stale() {
        let store = CacheStore::new(&CacheSettings::default());

        store.set_articles(vec![sample_article("old")], Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));

        assert!(store.get_articles().is_none());
        let stale = store.get_articles_stale().expect("stale entry present");
        assert_eq!(stale[0].slug, "old");
    }

    #[test]
    fn set_replaces_wholesale() {
        let store = CacheStore::new(&CacheSettings::default());

        store.set_articles(vec![sample_article("first")], Duration::from_secs(300));
        store.set_articles(vec![sample_article("second")], Duration::from_secs(300));

        let cached = store.get_articles().expect("cached articles");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].slug, "second");
    }

    #[test]
    fn tag_lists_evict_by_lru() {
        let store = CacheStore::new(&settings_with_tag_limit(2));
        let ttl = Duration::from_secs(1800);

        store.set_article_tags("a", vec![sample_tag("rust")], ttl);
        store.set_article_tags("b", vec![sample_tag("web")], ttl);
        store.set_article_tags("c", vec![sample_tag("cache")], ttl);

        assert!(store.get_article_tags("a").is_none()); // evicted
        assert!(store.get_article_tags("b").is_some());
        assert!(store.get_article_tags("c").is_some());
    }

    #[test]
    fn expired_tag_list_serves_stale_only() {
        let store = CacheStore::new(&CacheSettings::default());

        store.set_article_tags("post", vec![sample_tag("rust")], Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));

        assert!(store.get_article_tags("post").is_none());
        let stale = store.get_article_tags_stale("post").expect("stale tags");
        assert_eq!(stale[0].slug, "rust");

        store.invalidate_article_tags("post");
        assert!(store.get_article_tags_stale("post").is_none());
    }

    #[test]
    fn clear_empties_every_slot() {
        let store = CacheStore::new(&CacheSettings::default());
        let ttl = Duration::from_secs(300);

        store.set_articles(vec![sample_article("one")], ttl);
        store.set_article_tags("one", vec![sample_tag("rust")], ttl);

        store.clear();

        assert!(store.get_articles_stale().is_none());
        assert!(store.get_article_tags_stale("one").is_none());
        assert!(store.get_products_stale().is_none());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = CacheStore::new(&CacheSettings::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .articles
                .write()
                .expect("articles lock should be acquired");
            panic!("poison articles lock");
        }));

        store.set_articles(vec![sample_article("after")], Duration::from_secs(300));
        assert!(store.get_articles().is_some());
    }
}
