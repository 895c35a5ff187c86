use std::{process, sync::Arc};

use brezza::{
    application::{
        articles::ArticleService,
        categories::CategoryService,
        clients::{CatalogClient, ContentClient},
        error::AppError,
        products::ProductService,
    },
    cache::CacheStore,
    config,
    infra::{
        http::{self, HttpState},
        telemetry,
        upstream::{CatalogHttpClient, CmsClient},
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    // `serve` is the only command; bare invocation defaults to it.
    let _command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    run_serve(settings).await
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = Arc::new(CacheStore::new(&settings.cache));

    let content: Arc<dyn ContentClient> =
        Arc::new(CmsClient::new(&settings.upstream).map_err(AppError::from)?);
    let catalog: Arc<dyn CatalogClient> =
        Arc::new(CatalogHttpClient::new(&settings.upstream).map_err(AppError::from)?);

    let articles = Arc::new(ArticleService::new(
        Arc::clone(&content),
        Arc::clone(&store),
        &settings.cache,
    ));
    let categories = Arc::new(CategoryService::new(Arc::clone(&articles), content));
    let products = Arc::new(ProductService::new(catalog, store, &settings.cache));

    // Warm the article cache without delaying startup.
    let warm_handle = {
        let articles = Arc::clone(&articles);
        tokio::spawn(async move {
            if let Err(err) = articles.cached_or_fetch(false).await {
                warn!(error = %err, "Startup cache warm failed, first request will fetch");
            }
        })
    };

    let state = HttpState {
        articles,
        categories,
        products,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(brezza::infra::error::InfraError::from(err)))?;

    info!(addr = %settings.server.addr, "Listening");

    let result = axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));

    warm_handle.abort();
    let _ = warm_handle.await;

    result
}
