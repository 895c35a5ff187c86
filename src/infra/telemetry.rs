use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "brezza_cache_hit_total",
            Unit::Count,
            "Total number of strict cache hits, labelled by slot."
        );
        describe_counter!(
            "brezza_cache_miss_total",
            Unit::Count,
            "Total number of strict cache misses, labelled by slot."
        );
        describe_counter!(
            "brezza_cache_stale_serve_total",
            Unit::Count,
            "Total number of responses served from an expired cache entry."
        );
        describe_counter!(
            "brezza_upstream_fetch_total",
            Unit::Count,
            "Total number of upstream fetches, labelled by collection."
        );
        describe_counter!(
            "brezza_upstream_failure_total",
            Unit::Count,
            "Total number of failed upstream fetches, labelled by collection."
        );
    });
}
