//! REST client for the digital-commerce catalog API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::application::clients::{CatalogClient, UpstreamError};
use crate::config::UpstreamSettings;
use crate::domain::entities::ProductRecord;
use crate::infra::error::InfraError;

const API_KEY_HEADER: &str = "x-api-key";

pub struct CatalogHttpClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl CatalogHttpClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("brezza/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build catalog HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint: settings.catalog_endpoint.clone(),
            api_key: settings.catalog_key.clone(),
        })
    }

    // Appends a path segment so `…/api` and `…/api/` both resolve to
    // `…/api/products`.
    fn products_url(&self) -> Result<Url, UpstreamError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::payload("catalog endpoint cannot be a base URL"))?
            .pop_if_empty()
            .push("products");
        Ok(url)
    }
}

#[async_trait]
impl CatalogClient for CatalogHttpClient {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, UpstreamError> {
        let mut request = self.client.get(self.products_url()?);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| UpstreamError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let payload: ProductListDto = response
            .json()
            .await
            .map_err(|err| UpstreamError::payload(err.to_string()))?;

        Ok(payload
            .products
            .into_iter()
            .map(ProductDto::into_record)
            .collect())
    }
}

#[derive(Deserialize)]
struct ProductListDto {
    #[serde(default)]
    products: Vec<ProductDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDto {
    id: String,
    slug: String,
    name: String,
    price_cents: Option<u64>,
    currency: Option<String>,
    cover_image: Option<String>,
}

impl ProductDto {
    fn into_record(self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            slug: self.slug,
            name: self.name,
            price_cents: self.price_cents.unwrap_or(0),
            currency: self.currency.unwrap_or_else(|| "USD".to_string()),
            cover_image: self.cover_image,
        }
    }
}
