use anyhow::{Context, Result};
use sea_orm::Database;
use service::credentials;
use tracing::{info, trace};

use crate::config::AppConfig;

pub async fn set_active(username: &str, active: bool, database_url: Option<String>) -> Result<()> {
    trace!("Entering set_active function");

    let config = AppConfig::load()?.with_overrides(database_url, None);
    let db = Database::connect(&config.database_url).await?;

    let user = credentials::set_active(&db, username, active)
        .await
        .with_context(|| format!("Failed to update activation of '{}'", username))?;

    info!(
        "User '{}' (ID {}) is now {}",
        user.username,
        user.id,
        if user.is_active { "active" } else { "deactivated" }
    );
    Ok(())
}
