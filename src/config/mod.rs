//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brezza";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CMS_ENDPOINT: &str = "http://127.0.0.1:1337/graphql";
const DEFAULT_CATALOG_ENDPOINT: &str = "http://127.0.0.1:4000/api";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ARTICLE_TTL_SECS: u64 = 300;
const DEFAULT_TAG_TTL_SECS: u64 = 1800;
const DEFAULT_PRODUCT_TTL_SECS: u64 = 600;
const DEFAULT_TAG_LIST_LIMIT: usize = 200;

/// Command-line arguments for the brezza binary.
#[derive(Debug, Parser)]
#[command(name = "brezza", version, about = "Brezza content API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BREZZA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the brezza HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit JSON-formatted logs.
    #[arg(long = "log-json")]
    pub log_json: Option<bool>,

    /// Override the CMS GraphQL endpoint.
    #[arg(long = "cms-endpoint", value_name = "URL")]
    pub cms_endpoint: Option<String>,

    /// Override the CMS bearer token.
    #[arg(long = "cms-token", env = "BREZZA_CMS_TOKEN", value_name = "TOKEN")]
    pub cms_token: Option<String>,

    /// Override the commerce catalog endpoint.
    #[arg(long = "catalog-endpoint", value_name = "URL")]
    pub catalog_endpoint: Option<String>,

    /// Override the catalog API key.
    #[arg(long = "catalog-key", env = "BREZZA_CATALOG_KEY", value_name = "KEY")]
    pub catalog_key: Option<String>,

    /// Override the upstream request timeout in seconds.
    #[arg(long = "upstream-timeout-seconds", value_name = "SECONDS")]
    pub upstream_timeout_seconds: Option<u64>,

    /// Override the article cache TTL in seconds.
    #[arg(long = "cache-article-ttl-seconds", value_name = "SECONDS")]
    pub cache_article_ttl_seconds: Option<u64>,

    /// Override the per-article tag cache TTL in seconds.
    #[arg(long = "cache-tag-ttl-seconds", value_name = "SECONDS")]
    pub cache_tag_ttl_seconds: Option<u64>,

    /// Override the product cache TTL in seconds.
    #[arg(long = "cache-product-ttl-seconds", value_name = "SECONDS")]
    pub cache_product_ttl_seconds: Option<u64>,

    /// Override the per-article tag list cache capacity.
    #[arg(long = "cache-tag-list-limit", value_name = "COUNT")]
    pub cache_tag_list_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub cms_endpoint: Url,
    pub cms_token: Option<String>,
    pub catalog_endpoint: Url,
    pub catalog_key: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub article_ttl: Duration,
    pub tag_ttl: Duration,
    pub product_ttl: Duration,
    pub tag_list_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            article_ttl: Duration::from_secs(DEFAULT_ARTICLE_TTL_SECS),
            tag_ttl: Duration::from_secs(DEFAULT_TAG_TTL_SECS),
            product_ttl: Duration::from_secs(DEFAULT_PRODUCT_TTL_SECS),
            tag_list_limit: DEFAULT_TAG_LIST_LIMIT,
        }
    }
}

impl CacheSettings {
    /// Tag list capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn tag_list_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.tag_list_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BREZZA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Parse CLI arguments and load the full settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    upstream: RawUpstreamSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    cms_endpoint: Option<String>,
    cms_token: Option<String>,
    catalog_endpoint: Option<String>,
    catalog_key: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    article_ttl_seconds: Option<u64>,
    tag_ttl_seconds: Option<u64>,
    product_ttl_seconds: Option<u64>,
    tag_list_limit: Option<usize>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(endpoint) = overrides.cms_endpoint.as_ref() {
            self.upstream.cms_endpoint = Some(endpoint.clone());
        }
        if let Some(token) = overrides.cms_token.as_ref() {
            self.upstream.cms_token = Some(token.clone());
        }
        if let Some(endpoint) = overrides.catalog_endpoint.as_ref() {
            self.upstream.catalog_endpoint = Some(endpoint.clone());
        }
        if let Some(key) = overrides.catalog_key.as_ref() {
            self.upstream.catalog_key = Some(key.clone());
        }
        if let Some(seconds) = overrides.upstream_timeout_seconds {
            self.upstream.request_timeout_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_article_ttl_seconds {
            self.cache.article_ttl_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_tag_ttl_seconds {
            self.cache.tag_ttl_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_product_ttl_seconds {
            self.cache.product_ttl_seconds = Some(seconds);
        }
        if let Some(limit) = overrides.cache_tag_list_limit {
            self.cache.tag_list_limit = Some(limit);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            upstream,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            upstream: build_upstream_settings(upstream)?,
            cache: build_cache_settings(cache),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|err| LoadError::invalid("server.host", format!("failed to parse: {err}")))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let cms_endpoint = parse_endpoint(
        upstream.cms_endpoint.as_deref().unwrap_or(DEFAULT_CMS_ENDPOINT),
        "upstream.cms_endpoint",
    )?;
    let catalog_endpoint = parse_endpoint(
        upstream
            .catalog_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_CATALOG_ENDPOINT),
        "upstream.catalog_endpoint",
    )?;

    let request_timeout = Duration::from_secs(
        upstream
            .request_timeout_seconds
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1),
    );

    Ok(UpstreamSettings {
        cms_endpoint,
        cms_token: non_empty(upstream.cms_token),
        catalog_endpoint,
        catalog_key: non_empty(upstream.catalog_key),
        request_timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    CacheSettings {
        article_ttl: Duration::from_secs(
            cache.article_ttl_seconds.unwrap_or(DEFAULT_ARTICLE_TTL_SECS),
        ),
        tag_ttl: Duration::from_secs(cache.tag_ttl_seconds.unwrap_or(DEFAULT_TAG_TTL_SECS)),
        product_ttl: Duration::from_secs(
            cache.product_ttl_seconds.unwrap_or(DEFAULT_PRODUCT_TTL_SECS),
        ),
        tag_list_limit: cache.tag_list_limit.unwrap_or(DEFAULT_TAG_LIST_LIMIT),
    }
}

fn parse_endpoint(value: &str, key: &'static str) -> Result<Url, LoadError> {
    Url::parse(value).map_err(|err| LoadError::invalid(key, format!("failed to parse: {err}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
