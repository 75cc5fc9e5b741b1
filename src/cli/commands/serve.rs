use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::{initialize_app_state, AppConfig};
use crate::router::create_router;

pub async fn serve(database_url: Option<String>, bind_address: Option<String>) -> Result<()> {
    trace!("Entering serve function");
    info!("FastTrack application starting up");

    let config = AppConfig::load()?.with_overrides(database_url, bind_address);
    run_server(&config).await
}

/// Builds the state and router from `config` and serves until shutdown.
pub async fn run_server(config: &AppConfig) -> Result<()> {
    debug!("Bind address: {}", config.bind_address);

    // Initialize application state
    trace!("Initializing application state");
    let state = match initialize_app_state(config).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            return Err(e);
        }
    };

    // Create router
    trace!("Creating application router");
    let app = create_router(state);
    debug!("Router created successfully");

    // Start server
    info!("Starting server on {}", config.bind_address);
    let listener = match TcpListener::bind(&config.bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", config.bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", config.bind_address, e);
            return Err(e.into());
        }
    };

    info!("FastTrack API server running on http://{}", config.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
