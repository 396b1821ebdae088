//! REST API for the product catalog.
//!
//! `/api/products` CRUD over an in-process table. When a static directory
//! is configured, every other path serves the built SPA with an
//! `index.html` fallback. The shield (bot detection + per-client rate
//! limit) screens both.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod shield;

pub use config::{Config, ShieldConfig};
pub use db::{new_db, Db, Product};
pub use error::{AppError, ConfigError, ServerError};

use shield::Shield;

pub fn app(config: &Config) -> Router {
    app_with_db(config, new_db())
}

/// Build the router around an existing table.
pub fn app_with_db(config: &Config, db: Db) -> Router {
    let mut app = Router::new()
        .route("/api/products", get(routes::list_products).post(routes::create_product))
        .route(
            "/api/products/{id}",
            get(routes::get_product)
                .put(routes::update_product)
                .delete(routes::delete_product),
        )
        .with_state(db);

    if let Some(dir) = &config.static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    // After the fallback so static assets are screened as well.
    if config.shield.enabled {
        let shield = Arc::new(Shield::new(config.shield.clone()));
        app = app.layer(middleware::from_fn_with_state(shield, shield::protect));
    }

    app.layer(SetResponseHeaderLayer::if_not_present(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    ))
    .layer(SetResponseHeaderLayer::if_not_present(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    ))
    .layer(SetResponseHeaderLayer::if_not_present(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    ))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves. Peer addresses are recorded so the
/// shield can key rate limits by client IP.
pub async fn run<F>(listener: TcpListener, config: Config, shutdown: F) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = app(&config);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}

pub fn init_logging() -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| ServerError::Logging(e.to_string()))
}

pub async fn start_server() -> Result<(), ServerError> {
    // Missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();
    init_logging()?;

    let config = Config::from_env()?;
    let address = config.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!(
        shield = config.shield.enabled,
        static_dir = ?config.static_dir,
        "Server running on {address}"
    );

    run(listener, config, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
