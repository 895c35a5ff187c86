//! Commerce catalog passthrough with the same cache discipline as the
//! article service: strict read, upstream on miss, stale on failure.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::warn;

use crate::application::clients::CatalogClient;
use crate::application::error::ContentError;
use crate::cache::CacheStore;
use crate::config::CacheSettings;
use crate::domain::entities::ProductRecord;

pub struct ProductService {
    catalog: Arc<dyn CatalogClient>,
    store: Arc<CacheStore>,
    product_ttl: Duration,
}

impl ProductService {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        store: Arc<CacheStore>,
        settings: &CacheSettings,
    ) -> Self {
        Self {
            catalog,
            store,
            product_ttl: settings.product_ttl,
        }
    }

    pub async fn list(&self) -> Result<Vec<ProductRecord>, ContentError> {
        if let Some(products) = self.store.get_products() {
            return Ok(products);
        }

        counter!("brezza_upstream_fetch_total", "collection" => "products").increment(1);
        match self.catalog.list_products().await {
            Ok(products) => {
                self.store.set_products(products.clone(), self.product_ttl);
                Ok(products)
            }
            Err(err) => {
                counter!("brezza_upstream_failure_total", "collection" => "products").increment(1);
                match self.store.get_products_stale() {
                    Some(stale) => {
                        counter!("brezza_cache_stale_serve_total", "slot" => "products")
                            .increment(1);
                        warn!(
                            error = %err,
                            products = stale.len(),
                            "Catalog fetch failed, serving stale product list"
                        );
                        Ok(stale)
                    }
                    None => Err(ContentError::Upstream(err)),
                }
            }
        }
    }
}
