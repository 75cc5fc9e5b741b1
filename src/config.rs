use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use sea_orm::{ConnectOptions, Database};
use serde::Deserialize;
use service::TokenIssuer;
use tracing::{debug, info, warn};

use crate::schemas::AppState;

/// Secret used when none is configured. Only suitable for local development.
pub const DEFAULT_JWT_SECRET: &str = "your-secret-key";

/// Runtime configuration.
///
/// Sources, lowest priority first: built-in defaults, an optional
/// `fasttrack.{toml,yaml,json}` file in the working directory, then
/// `FASTTRACK_*` environment variables (e.g. `FASTTRACK_JWT_SECRET`).
/// A `.env` file is loaded into the environment beforehand.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    pub max_connections: u32,
    pub min_connections: u32,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", "sqlite://fasttrack.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("access_token_ttl_minutes", 1440_i64)?
            .set_default("refresh_token_ttl_hours", 168_i64)?
            .set_default("max_connections", 100_i64)?
            .set_default("min_connections", 10_i64)?
            .set_default("request_timeout_secs", 30_i64)?
            .add_source(File::with_name("fasttrack").required(false))
            .add_source(Environment::with_prefix("FASTTRACK"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!(?config.bind_address, "Configuration loaded");
        Ok(config)
    }

    /// Applies command-line values on top of the loaded configuration.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    pub fn token_issuer(&self) -> TokenIssuer {
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using the default JWT secret; set FASTTRACK_JWT_SECRET in production");
        }
        TokenIssuer::new(
            &self.jwt_secret,
            chrono::Duration::minutes(self.access_token_ttl_minutes),
            chrono::Duration::hours(self.refresh_token_ttl_hours),
        )
    }
}

/// Connect the pool and build the shared application state.
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    info!("Connecting to database");
    debug!("Database URL: {}", config.database_url);

    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", config.database_url))?;

    Ok(AppState {
        db,
        tokens: Arc::new(config.token_issuer()),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    })
}
