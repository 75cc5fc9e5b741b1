use anyhow::{Context, Result};
use model::entities::user::Role;
use sea_orm::Database;
use service::credentials;
use tracing::{info, trace};

use crate::config::AppConfig;

pub async fn promote_admin(username: &str, revoke: bool, database_url: Option<String>) -> Result<()> {
    trace!("Entering promote_admin function");

    let config = AppConfig::load()?.with_overrides(database_url, None);
    let db = Database::connect(&config.database_url).await?;

    let role = if revoke { Role::User } else { Role::Admin };
    let user = credentials::set_role(&db, username, role)
        .await
        .with_context(|| format!("Failed to set role of '{}'", username))?;

    info!("User '{}' (ID {}) now has role '{}'", user.username, user.id, user.role);
    Ok(())
}
