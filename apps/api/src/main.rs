mod auth;
mod config;
mod db;
mod errors;
mod models;
mod notify;
mod render;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::jwt::TokenSigner;
use crate::auth::service::TokenService;
use crate::auth::store::PgTokenStore;
use crate::auth::sweeper::spawn_sweeper;
use crate::config::Config;
use crate::db::create_pool;
use crate::notify::NotificationHub;
use crate::render::assembler::DocumentAssembler;
use crate::render::compiler::LatexCompiler;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgPortfolioStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portfolio API v{}", env!("CARGO_PKG_VERSION"));
    if config.has_placeholder_secret() {
        warn!("JWT_SECRET is a placeholder value; set a strong secret before deploying");
    }

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    let tokens = TokenService::new(
        TokenSigner::new(&config.jwt_secret),
        Arc::new(PgTokenStore::new(db.clone())),
        chrono::Duration::minutes(config.access_token_ttl_minutes),
    );
    info!("Access tokens live for {} minutes", config.access_token_ttl_minutes);

    let assembler = DocumentAssembler::bundled().context("invalid bundled layout config")?;
    let mut compiler = LatexCompiler::new(
        config.latex_bin.clone(),
        Duration::from_secs(config.latex_timeout_secs),
    );
    if let Some(dir) = &config.latex_scratch_dir {
        compiler = compiler.with_scratch_root(dir);
    }
    info!(
        "LaTeX toolchain: {} (timeout {}s)",
        compiler.program(),
        config.latex_timeout_secs
    );

    // Build app state
    let state = AppState {
        portfolio: Arc::new(PgPortfolioStore::new(db)),
        tokens: tokens.clone(),
        assembler,
        compiler,
        hub: NotificationHub::default(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(
        tokens,
        Duration::from_secs(config.token_sweep_interval_secs),
        shutdown_rx,
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        warn!("Token sweeper ended abnormally: {e}");
    }
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
