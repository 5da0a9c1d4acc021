//! Short-link redirect host and console server
#![forbid(unsafe_code)]

use shortlink_core::context_error::{ContextError, ResultExt};
use shortlink_web::build_app;
use std::net::{IpAddr, SocketAddr};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), ContextError> {
    let dotenv = dotenvy::dotenv();

    let (config, config_error) = match shortlink_core::Config::load() {
        Ok(config) => (config, None),
        Err(e) => (shortlink_core::Config::default(), Some(e)),
    };

    shortlink_core::init_logging(&config.logging)?;

    if let Err(e) = dotenv {
        info!("No .env file loaded: {}", e);
    }
    if let Some(e) = config_error {
        warn!("Failed to load config ({}), using defaults", e);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        revision = %config.redirect.revision,
        mode = ?config.redirect.mode,
        scheme = %config.signing.scheme,
        resolver = %config.api.resolver_url(),
        "Starting short-link server"
    );

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let app = build_app(config)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received terminate signal, shutting down gracefully...");
        },
    }
}
