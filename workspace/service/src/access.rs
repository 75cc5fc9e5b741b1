//! Access-control gate shared by every operation that needs an authenticated actor.

use model::entities::prelude::User;
use model::entities::user;
use sea_orm::ConnectionTrait;
use tracing::{debug, instrument, warn};

use crate::error::{Result, ServiceError};

/// Confirms that `user_id` refers to an existing, active user and returns it.
#[instrument(skip(db))]
pub async fn validate_user_access<C>(db: &C, user_id: i32) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let user = User::find_live_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!(user_id, "User not found during access validation");
            ServiceError::UserNotFound
        })?;

    if !user.is_active {
        warn!(user_id, "Deactivated user attempted access");
        return Err(ServiceError::Deactivated);
    }

    debug!(user_id, role = %user.role, "User access validated");
    Ok(user)
}

/// Fails with `InsufficientPermissions` unless the user is an admin.
pub fn require_admin(user: &user::Model) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        warn!(user_id = user.id, "Admin role required");
        Err(ServiceError::InsufficientPermissions)
    }
}
