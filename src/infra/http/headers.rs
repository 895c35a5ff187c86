//! Response cache headers derived from each route's configured TTL.
//!
//! The HTTP max-age governs downstream/CDN caching and is independent of
//! the server-side store TTL; `stale-while-revalidate` is set to half of
//! the max-age.

use axum::http::{HeaderName, header};

pub const ARTICLES_MAX_AGE: u64 = 300;
pub const LATEST_MAX_AGE: u64 = 300;
pub const TRENDING_MAX_AGE: u64 = 600;
pub const ARTICLES_BY_TAG_MAX_AGE: u64 = 600;
pub const ARTICLE_TAGS_MAX_AGE: u64 = 1800;
pub const CATEGORIES_MAX_AGE: u64 = 1800;
pub const CATEGORY_MAX_AGE: u64 = 600;
pub const POPULAR_CATEGORIES_MAX_AGE: u64 = 3600;
pub const PRODUCTS_MAX_AGE: u64 = 600;

pub fn cache_control(max_age_secs: u64) -> [(HeaderName, String); 1] {
    [(
        header::CACHE_CONTROL,
        format!(
            "public, max-age={max_age_secs}, stale-while-revalidate={}",
            max_age_secs / 2
        ),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_max_age_and_revalidate_window() {
        let [(name, value)] = cache_control(600);
        assert_eq!(name, header::CACHE_CONTROL);
        assert_eq!(value, "public, max-age=600, stale-while-revalidate=300");
    }
}
