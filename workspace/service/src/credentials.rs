//! User registration, login and profile management.

use model::entities::prelude::User;
use model::entities::user::{self, Role};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use tracing::{debug, error, info, instrument, warn};

use crate::access::validate_user_access;
use crate::error::{Result, ServiceError};
use crate::password::{hash_password, verify_password};
use crate::token::TokenIssuer;

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Profile fields to overwrite. `None` and empty strings leave the field as is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Tokens and user returned by a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: user::Model,
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn username_taken(
    db: &DatabaseConnection,
    username: &str,
    except_id: Option<i32>,
) -> Result<bool> {
    let mut query = User::find().filter(user::Column::Username.eq(username));
    if let Some(id) = except_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

async fn save_profile(db: &DatabaseConnection, active: user::ActiveModel) -> Result<user::Model> {
    active
        .update(db)
        .await
        .map_err(|e| ServiceError::unique_violation_or(e, ServiceError::UsernameTaken))
}

/// Creates an active account with the `user` role.
#[instrument(skip(db, new_user), fields(username = %new_user.username))]
pub async fn register(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    if username_taken(db, &new_user.username, None).await? {
        warn!("Username is already taken");
        return Err(ServiceError::UsernameTaken);
    }

    let password_hash = hash_password(&new_user.password)?;

    let created = user::ActiveModel {
        username: Set(new_user.username),
        password_hash: Set(password_hash),
        first_name: Set(new_user.first_name),
        last_name: Set(new_user.last_name),
        role: Set(Role::User),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| ServiceError::unique_violation_or(e, ServiceError::UsernameTaken))?;

    info!(user_id = created.id, "User registered");
    Ok(created)
}

/// Verifies credentials and issues an access/refresh token pair.
///
/// Unknown usernames and wrong passwords fail identically. A deactivated
/// account is refused before its password is checked.
#[instrument(skip(db, issuer, password))]
pub async fn login(
    db: &DatabaseConnection,
    issuer: &TokenIssuer,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let Some(user) = User::find_live_by_username(username).one(db).await? else {
        warn!("Login attempt for unknown username");
        return Err(ServiceError::InvalidCredentials);
    };

    if !user.is_active {
        warn!(user_id = user.id, "Login attempt for deactivated account");
        return Err(ServiceError::Deactivated);
    }

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    let access_token = issuer.generate_token(user.id, &user.username, user.role)?;
    let refresh_token = issuer.generate_refresh_token(user.id, &user.username, user.role)?;

    info!(user_id = user.id, "User logged in");
    Ok(LoginOutcome {
        access_token,
        refresh_token,
        user,
    })
}

#[instrument(skip(db))]
pub async fn get_profile(db: &DatabaseConnection, user_id: i32) -> Result<user::Model> {
    validate_user_access(db, user_id).await
}

/// Overwrites the supplied profile fields. A new username must not belong to
/// any other account.
#[instrument(skip(db))]
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    update: ProfileUpdate,
) -> Result<user::Model> {
    let user = validate_user_access(db, user_id).await?;
    let mut active = user.into_active_model();

    if let Some(username) = supplied(update.username) {
        if username_taken(db, &username, Some(user_id)).await? {
            warn!(user_id, %username, "Requested username is already taken");
            return Err(ServiceError::UsernameTaken);
        }
        active.username = Set(username);
    }
    if let Some(first_name) = supplied(update.first_name) {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = supplied(update.last_name) {
        active.last_name = Set(last_name);
    }

    let updated = save_profile(db, active).await?;

    info!(user_id, "Profile updated");
    Ok(updated)
}

/// Replaces the password hash after checking `current`. A wrong `current`
/// leaves the stored hash untouched.
#[instrument(skip(db, current, new))]
pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i32,
    current: &str,
    new: &str,
) -> Result<()> {
    let user = validate_user_access(db, user_id).await?;

    if !verify_password(current, &user.password_hash) {
        warn!(user_id, "Current password is incorrect");
        return Err(ServiceError::WrongCurrentPassword);
    }

    let password_hash = hash_password(new)?;
    let mut active = user.into_active_model();
    active.password_hash = Set(password_hash);
    active.update(db).await.map_err(|e| {
        error!(user_id, error = %e, "Failed to update password");
        ServiceError::Database(e)
    })?;

    info!(user_id, "Password changed");
    Ok(())
}

async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<user::Model> {
    User::find_live_by_username(username)
        .one(db)
        .await?
        .ok_or(ServiceError::UserNotFound)
}

/// Administrative role change.
#[instrument(skip(db))]
pub async fn set_role(db: &DatabaseConnection, username: &str, role: Role) -> Result<user::Model> {
    let user = find_by_username(db, username).await?;
    debug!(user_id = user.id, from = %user.role, to = %role, "Changing role");

    let mut active = user.into_active_model();
    active.role = Set(role);
    let updated = active.update(db).await?;

    info!(user_id = updated.id, role = %updated.role, "Role updated");
    Ok(updated)
}

/// Administrative activation or deactivation of an account.
#[instrument(skip(db))]
pub async fn set_active(
    db: &DatabaseConnection,
    username: &str,
    is_active: bool,
) -> Result<user::Model> {
    let user = find_by_username(db, username).await?;

    let mut active = user.into_active_model();
    active.is_active = Set(is_active);
    let updated = active.update(db).await?;

    info!(user_id = updated.id, is_active, "Activation flag updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{setup_db, test_issuer};

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_defaults_role() {
        let db = setup_db().await;
        let user = register(&db, new_user("ada", "secret-pass")).await.unwrap();

        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "secret-pass");
        assert!(verify_password("secret-pass", &user.password_hash));
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let db = setup_db().await;
        register(&db, new_user("ada", "secret-pass")).await.unwrap();

        let result = register(&db, new_user("ada", "another-pass")).await;
        assert!(matches!(result, Err(ServiceError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_login_success_issues_both_tokens() {
        let db = setup_db().await;
        let issuer = test_issuer();
        let user = register(&db, new_user("ada", "secret-pass")).await.unwrap();

        let outcome = login(&db, &issuer, "ada", "secret-pass").await.unwrap();
        assert_eq!(outcome.user.id, user.id);

        let claims = issuer.validate_access_token(&outcome.access_token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert!(issuer.refresh(&outcome.refresh_token).is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let db = setup_db().await;
        let issuer = test_issuer();
        register(&db, new_user("ada", "secret-pass")).await.unwrap();

        let unknown = login(&db, &issuer, "nobody", "secret-pass").await;
        let wrong = login(&db, &issuer, "ada", "wrong-pass").await;

        assert!(matches!(unknown, Err(ServiceError::InvalidCredentials)));
        assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_deactivated_account() {
        let db = setup_db().await;
        let issuer = test_issuer();
        register(&db, new_user("ada", "secret-pass")).await.unwrap();
        set_active(&db, "ada", false).await.unwrap();

        let result = login(&db, &issuer, "ada", "secret-pass").await;
        assert!(matches!(result, Err(ServiceError::Deactivated)));

        let wrong_password = login(&db, &issuer, "ada", "wrong-pass").await;
        assert!(matches!(wrong_password, Err(ServiceError::Deactivated)));
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_keeps_hash() {
        let db = setup_db().await;
        let user = register(&db, new_user("ada", "secret-pass")).await.unwrap();

        let result = change_password(&db, user.id, "not-it", "brand-new").await;
        assert!(matches!(result, Err(ServiceError::WrongCurrentPassword)));

        let stored = get_profile(&db, user.id).await.unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let db = setup_db().await;
        let issuer = test_issuer();
        let user = register(&db, new_user("ada", "secret-pass")).await.unwrap();

        change_password(&db, user.id, "secret-pass", "brand-new").await.unwrap();

        assert!(login(&db, &issuer, "ada", "brand-new").await.is_ok());
        assert!(matches!(
            login(&db, &issuer, "ada", "secret-pass").await,
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_username_index_conflict_maps_to_taken() {
        let db = setup_db().await;
        register(&db, new_user("ada", "secret-pass")).await.unwrap();
        let grace = register(&db, new_user("grace", "secret-pass")).await.unwrap();
        let grace_id = grace.id;

        // Write straight through the storage path, skipping the lookup.
        let mut active = grace.into_active_model();
        active.username = Set("ada".to_string());
        let result = save_profile(&db, active).await;
        assert!(matches!(result, Err(ServiceError::UsernameTaken)));

        let stored = get_profile(&db, grace_id).await.unwrap();
        assert_eq!(stored.username, "grace");
    }

    #[tokio::test]
    async fn test_update_profile_only_overwrites_supplied_fields() {
        let db = setup_db().await;
        let user = register(&db, new_user("ada", "secret-pass")).await.unwrap();

        let updated = update_profile(
            &db,
            user.id,
            ProfileUpdate {
                username: Some(String::new()),
                first_name: Some("Augusta".to_string()),
                last_name: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.username, "ada");
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.last_name, "Lovelace");
    }

    #[tokio::test]
    async fn test_update_profile_username_uniqueness() {
        let db = setup_db().await;
        let ada = register(&db, new_user("ada", "secret-pass")).await.unwrap();
        register(&db, new_user("grace", "secret-pass")).await.unwrap();

        let taken = update_profile(
            &db,
            ada.id,
            ProfileUpdate {
                username: Some("grace".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(taken, Err(ServiceError::UsernameTaken)));

        // Keeping one's own username is not a conflict.
        let same = update_profile(
            &db,
            ada.id,
            ProfileUpdate {
                username: Some("ada".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(same.username, "ada");
    }

    #[tokio::test]
    async fn test_set_role_and_unknown_user() {
        let db = setup_db().await;
        register(&db, new_user("ada", "secret-pass")).await.unwrap();

        let promoted = set_role(&db, "ada", Role::Admin).await.unwrap();
        assert!(promoted.is_admin());

        let missing = set_role(&db, "nobody", Role::Admin).await;
        assert!(matches!(missing, Err(ServiceError::UserNotFound)));
    }
}
