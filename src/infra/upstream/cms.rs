//! GraphQL client for the headless CMS content API.
//!
//! The upstream schema is an opaque contract; only the fields consumed
//! here are modelled. Timestamps arrive as RFC 3339 strings.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::application::clients::{ContentClient, UpstreamError};
use crate::config::UpstreamSettings;
use crate::domain::entities::{ArticleRecord, TagRecord};
use crate::infra::error::InfraError;

const ARTICLES_QUERY: &str = "\
query Articles {
  articles(sort: \"publishedAt:desc\") {
    id slug title brief coverImage publishedAt views likes
    tags { id slug name color }
  }
}";

const ARTICLE_TAGS_QUERY: &str = "\
query ArticleTags($slug: String!) {
  article(slug: $slug) {
    tags { id slug name color }
  }
}";

const ARTICLES_BY_CATEGORY_QUERY: &str = "\
query ArticlesByCategory($slug: String!, $limit: Int!) {
  articles(filters: { tags: { slug: { eq: $slug } } }, pagination: { limit: $limit }) {
    id slug title brief coverImage publishedAt views likes
    tags { id slug name color }
  }
}";

pub struct CmsClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl CmsClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build CMS HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            endpoint: settings.cms_endpoint.clone(),
            token: settings.cms_token.clone(),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
    ) -> Result<T, UpstreamError> {
        let body = json!({ "query": query, "variables": variables });

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
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

        let payload: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|err| UpstreamError::payload(err.to_string()))?;

        if let Some(error) = payload.errors.first() {
            return Err(UpstreamError::payload(error.message.clone()));
        }

        payload
            .data
            .ok_or_else(|| UpstreamError::payload("response carried no data"))
    }
}

#[async_trait]
impl ContentClient for CmsClient {
    async fn fetch_articles(&self) -> Result<Vec<ArticleRecord>, UpstreamError> {
        let data: ArticlesData = self.execute(ARTICLES_QUERY, json!({})).await?;
        data.articles.into_iter().map(ArticleDto::into_record).collect()
    }

    async fn fetch_article_tags(&self, slug: &str) -> Result<Vec<TagRecord>, UpstreamError> {
        let data: ArticleTagsData = self
            .execute(ARTICLE_TAGS_QUERY, json!({ "slug": slug }))
            .await?;
        Ok(data
            .article
            .map(|article| article.tags.into_iter().map(TagDto::into_record).collect())
            .unwrap_or_default())
    }

    async fn fetch_articles_by_category(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<Vec<ArticleRecord>, UpstreamError> {
        let data: ArticlesData = self
            .execute(
                ARTICLES_BY_CATEGORY_QUERY,
                json!({ "slug": slug, "limit": limit }),
            )
            .await?;
        data.articles.into_iter().map(ArticleDto::into_record).collect()
    }
}

fn user_agent() -> &'static str {
    concat!("brezza/", env!("CARGO_PKG_VERSION"))
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct ArticlesData {
    #[serde(default)]
    articles: Vec<ArticleDto>,
}

#[derive(Deserialize)]
struct ArticleTagsData {
    article: Option<ArticleTagsDto>,
}

#[derive(Deserialize)]
struct ArticleTagsDto {
    #[serde(default)]
    tags: Vec<TagDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleDto {
    id: String,
    slug: String,
    title: String,
    brief: Option<String>,
    cover_image: Option<String>,
    published_at: String,
    views: Option<u64>,
    likes: Option<u64>,
    #[serde(default)]
    tags: Vec<TagDto>,
}

impl ArticleDto {
    fn into_record(self) -> Result<ArticleRecord, UpstreamError> {
        let published_at =
            OffsetDateTime::parse(&self.published_at, &Rfc3339).map_err(|err| {
                UpstreamError::payload(format!(
                    "article `{}` has unparseable publishedAt: {err}",
                    self.slug
                ))
            })?;

        Ok(ArticleRecord {
            id: self.id,
            slug: self.slug,
            title: self.title,
            brief: self.brief.unwrap_or_default(),
            cover_image: self.cover_image,
            published_at,
            tags: self.tags.into_iter().map(TagDto::into_record).collect(),
            views: self.views.unwrap_or(0),
            likes: self.likes.unwrap_or(0),
        })
    }
}

#[derive(Deserialize)]
struct TagDto {
    id: String,
    slug: String,
    name: String,
    color: Option<String>,
}

impl TagDto {
    fn into_record(self) -> TagRecord {
        TagRecord {
            id: self.id,
            slug: self.slug,
            name: self.name,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_dto_maps_missing_counters_to_zero() {
        let dto: ArticleDto = serde_json::from_value(json!({
            "id": "1",
            "slug": "hello",
            "title": "Hello",
            "publishedAt": "2024-02-01T08:30:00Z",
        }))
        .expect("valid dto");

        let record = dto.into_record().expect("valid record");
        assert_eq!(record.views, 0);
        assert_eq!(record.likes, 0);
        assert!(record.brief.is_empty());
        assert!(record.tags.is_empty());
        assert_eq!(record.published_at.year(), 2024);
    }

    #[test]
    fn unparseable_timestamp_is_a_payload_error() {
        let dto: ArticleDto = serde_json::from_value(json!({
            "id": "1",
            "slug": "broken",
            "title": "Broken",
            "publishedAt": "last tuesday",
        }))
        .expect("valid dto");

        assert!(matches!(
            dto.into_record(),
            Err(UpstreamError::Payload { .. })
        ));
    }

    #[test]
    fn graphql_errors_take_precedence_over_data() {
        let payload: GraphQlResponse<ArticlesData> = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "boom" }],
        }))
        .expect("valid response");

        assert_eq!(payload.errors[0].message, "boom");
        assert!(payload.data.is_none());
    }
}
