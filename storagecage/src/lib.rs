//! # StorageCage
//!
//! A small HTTP API that lists, uploads and deletes files in a single storage directory.
//!
//! Every client-supplied file name is reduced to its final path segment before it touches the
//! filesystem, so the API can never read, write or remove anything outside the configured
//! storage directory.
//!
//! ## Architecture
//!
//! - **[`api`]**: Axum handlers and their JSON models
//! - **[`storage`]**: The [`storage::FileStore`] trait, path resolution and the local filesystem backend
//! - **[`config`]**: YAML + environment configuration via figment
//! - **[`errors`]**: API error type and its mapping onto HTTP responses
//! - **[`telemetry`]**: Tracing subscriber and optional OTLP export
//!
//! ## Endpoints
//!
//! | Method | Path                    | Purpose                         |
//! |--------|-------------------------|---------------------------------|
//! | GET    | `/`                     | Liveness greeting               |
//! | GET    | `/healthz`              | Health probe                    |
//! | GET    | `/api/v1/files`         | List stored files               |
//! | POST   | `/api/v1/files`         | Upload a file (multipart `file`) |
//! | DELETE | `/api/v1/files/{name}`  | Delete a file                   |
//! | GET    | `/docs`                 | API documentation               |
//!
//! ## Running
//!
//! ```no_run
//! use storagecage::{Application, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! Application::new(config).await?.serve(std::future::pending()).await
//! # }
//! ```

pub mod api;
pub mod config;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use crate::{
    config::CorsOrigin,
    openapi::ApiDoc,
    storage::{FileStore, LocalFileStore, StorageRoot},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderName, HeaderValue, Method},
    routing::{delete, get},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use config::Config;

/// Room left in the request body limit for multipart boundaries and part headers
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn FileStore>,
}

/// Build the CORS layer from config.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    let allow_origin = if cors_config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            origins.push(origin.as_header_value().parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    let mut exposed_headers = Vec::new();
    for header in &cors_config.exposed_headers {
        exposed_headers.push(header.parse::<HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            http::header::ACCEPT,
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers(exposed_headers)
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Body limit for the upload route, sized so the handler's own size check is what rejects
/// oversized files.
fn upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    if max_file_size == 0 {
        return DefaultBodyLimit::disable();
    }
    let limit = max_file_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Build the application router with all endpoints and middleware.
///
/// # Errors
///
/// Returns an error if the CORS configuration contains an origin or header name that is not a
/// valid HTTP header value.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let file_routes = Router::new()
        .route(
            "/files",
            get(api::handlers::files::list_files)
                .post(api::handlers::files::upload_file)
                .layer(upload_body_limit(state.config.limits.files.max_file_size)),
        )
        .route("/files/", delete(api::handlers::files::delete_file_without_name))
        .route("/files/{name}", delete(api::handlers::files::delete_file))
        .with_state(state.clone());

    let router = Router::new()
        .route("/", get(api::handlers::health::root))
        .route("/healthz", get(api::handlers::health::healthz))
        .nest("/api/v1", file_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"));

    let mut router = if state.config.cors.enabled {
        router.layer(create_cors_layer(&state.config)?)
    } else {
        router
    };

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns the router and its configuration.
///
/// 1. **Create**: [`Application::new`] prepares the storage directory and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown future resolves, in-flight requests drain and telemetry is flushed
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with the storage directory in place
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting StorageCage with configuration: {:#?}", config);

        let store = LocalFileStore::new(StorageRoot::new(&config.storage_dir));
        if config.create_storage_dir {
            store.ensure_root().await?;
        } else if !store.root().path().is_dir() {
            tracing::warn!(
                storage_dir = %store.root().path().display(),
                "Storage directory does not exist; file operations will fail until it is created"
            );
        }

        let app_state = AppState::builder().config(config.clone()).store(Arc::new(store)).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "StorageCage listening on http://{}, serving {}",
            bind_addr,
            self.config.storage_dir.display()
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
