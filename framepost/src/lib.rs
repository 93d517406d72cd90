//! # framepost: Media Branding and Social Publishing
//!
//! `framepost` is the backend for a small marketing studio: it keeps a library of
//! uploaded images, stamps each one with a brand overlay, and publishes the result
//! to social platforms through their HTTP APIs. Every publish attempt is recorded
//! in a local ledger, and a lightweight lead-capture endpoint backs the public
//! contact form.
//!
//! ## Overview
//!
//! The service is built around one operation: *create and post*. A client submits
//! a caption and a comma-separated list of platforms; the service picks the newest
//! image in the media library, produces a branded copy (done once, shared by every
//! platform in the request), inserts one ledger row per platform, and then either
//! publishes immediately or leaves the row in `scheduled` state for a later run.
//!
//! Platform outcomes are deliberately independent. Facebook refusing a token must
//! not stop the Instagram publish that was requested alongside it, so transport
//! and API errors are captured per platform on the ledger row rather than
//! propagated. Only storage problems abort a cycle.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the
//! HTTP layer and uses SQLite for persistence, so a single binary plus one
//! database file is a complete deployment.
//!
//! The **API layer** ([`api`]) is a small flat surface: media upload/list, the
//! create-and-post operation, post history, and lead capture. The **media layer**
//! ([`media`]) owns the upload directory and the brand overlay renderer. The
//! **publish layer** ([`publish`]) holds the per-platform integrations (Meta
//! Graph API for Facebook and Instagram, a simulated Twitter integration) and the
//! orchestrator that runs a full cycle. The **database layer** ([`db`]) uses the
//! repository pattern; each entity has a handler owning its queries.
//!
//! The dashboard and public pages are embedded into the binary at compile time
//! and served from the router's fallback, with interactive API docs at `/docs`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use framepost::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = framepost::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize structured logging
//!     framepost::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application uses SQLite (the file is created if missing) and runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::SqlitePool;
//! # async fn example(pool: SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
//! framepost::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
mod openapi;
pub mod publish;
mod static_assets;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod test;

use std::str::FromStr;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use bon::Builder;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::media::{BrandOverlay, MediaStore};
use crate::openapi::ApiDoc;
use crate::publish::{Orchestrator, Publisher};

pub use config::Config;
pub use types::{LeadId, PostId};

/// Application state shared across all request handlers.
///
/// Everything here is a cheap clone: the pool and the orchestrator's components
/// are shared handles.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub store: MediaStore,
    pub orchestrator: Orchestrator,
}

/// Get the framepost database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router with all endpoints and middleware.
///
/// This constructs the complete Axum router with:
/// - Media upload and listing
/// - The create-and-post operation and the post ledger
/// - Lead capture
/// - Uploaded media served as static files
/// - OpenAPI docs at `/docs`
/// - Embedded site pages served from the fallback
/// - CORS and tracing middleware
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.media.max_upload_bytes;
    let media_dir = state.store.upload_dir().to_path_buf();
    // Mount uploads under their directory name so the store-relative paths the
    // API returns double as URL paths.
    let media_mount = media_dir
        .file_name()
        .map(|name| format!("/{}", name.to_string_lossy()))
        .unwrap_or_else(|| "/uploads".to_string());

    let api_routes = Router::new()
        .route(
            "/upload",
            post(api::handlers::media::upload_media).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/media/list", get(api::handlers::media::list_media))
        .route("/create_and_post", post(api::handlers::posts::create_and_post))
        .route("/posts", get(api::handlers::posts::list_posts))
        .route("/save_lead", post(api::handlers::leads::save_lead))
        .route("/leads", get(api::handlers::leads::list_leads))
        .with_state(state);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(api_routes)
        .nest_service(&media_mount, ServeDir::new(media_dir))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(api::handlers::static_assets::serve_embedded_asset)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations,
///    prepares the media library, and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests
/// 3. **Shutdown**: when the shutdown signal resolves, in-flight requests drain
///    and the pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], but reusing an existing pool. Tests hand in
    /// the per-test database here.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting framepost with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => {
                let options = SqliteConnectOptions::from_str(&config.database.url)
                    .with_context(|| {
                        format!("Invalid database url '{}'", config.database.url)
                    })?
                    .create_if_missing(true);
                SqlitePoolOptions::new()
                    .connect_with(options)
                    .await
                    .context("Failed to connect to database")?
            }
        };
        migrator().run(&pool).await?;

        let store = MediaStore::new(config.media.upload_dir.clone());
        store.ensure_dir().await?;

        let overlay = BrandOverlay::new(&config.branding, store.media_root().to_path_buf());
        let publisher = Publisher::new(&config)?;
        let orchestrator = Orchestrator::new(
            pool.clone(),
            store.clone(),
            overlay,
            publisher,
            config.posting.clone(),
        );

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .store(store)
            .orchestrator(orchestrator)
            .build();
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
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
            "Framepost listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
