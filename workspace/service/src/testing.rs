//! Shared fixtures for unit tests of this crate.

use chrono::Duration;
use migration::{Migrator, MigratorTrait};
use model::entities::user::Role;
use model::entities::{card, user};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

use crate::password::hash_password;
use crate::token::TokenIssuer;

/// In-memory SQLite database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new("test-secret", Duration::minutes(15), Duration::hours(24))
}

pub async fn insert_user(db: &DatabaseConnection, username: &str, role: Role) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(hash_password("password123").expect("hashing failed")),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        role: Set(role),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

pub async fn insert_card(db: &DatabaseConnection, card_name: &str, quantity: i32) -> card::Model {
    card::ActiveModel {
        card_name: Set(card_name.to_string()),
        card_image: Set(format!("{}.png", card_name.to_lowercase())),
        card_quantity: Set(quantity),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert card")
}
