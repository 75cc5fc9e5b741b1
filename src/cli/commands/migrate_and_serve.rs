use anyhow::Result;
use tracing::{debug, info, trace};

use super::initdb::run_migrations;
use super::serve::run_server;
use crate::config::AppConfig;

pub async fn migrate_and_serve(database_url: Option<String>, bind_address: Option<String>) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    let config = AppConfig::load()?.with_overrides(database_url, bind_address);
    debug!("Database URL: {}", config.database_url);

    let db = run_migrations(&config.database_url).await?;
    db.close().await?;

    run_server(&config).await
}
