#[cfg(test)]
pub mod test_utils {
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user::{self, Role};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
    use serde_json::{json, Value};
    use service::TokenIssuer;
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_PASSWORD: &str = "password123";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let tokens = TokenIssuer::new(
            "integration-test-secret",
            chrono::Duration::minutes(15),
            chrono::Duration::hours(24),
        );

        AppState {
            db,
            tokens: Arc::new(tokens),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set. Only the first call installs the
    /// subscriber.
    fn init_test_tracing() {
        // Get log level from environment variable or default to WARN
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    /// Create axum app for testing, together with the state it runs on
    pub async fn setup_test_app_with_state() -> (Router, AppState) {
        init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state.clone());
        (router, state)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        setup_test_app_with_state().await.0
    }

    /// Register `username` with [`TEST_PASSWORD`], log in and return
    /// `(user_id, access_token)`.
    pub async fn register_and_login(server: &TestServer, username: &str) -> (i64, String) {
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": username,
                "password": TEST_PASSWORD,
                "first_name": "Test",
                "last_name": "User",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let user_id = body["data"]["id"].as_i64().expect("user id");

        let token = login(server, username, TEST_PASSWORD).await;
        (user_id, token)
    }

    pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        body["data"]["token"].as_str().expect("access token").to_string()
    }

    /// Give an existing account the admin role directly in the database.
    pub async fn make_admin(db: &DatabaseConnection, user_id: i64) {
        let user = user::Entity::find_by_id(user_id as i32)
            .one(db)
            .await
            .expect("query failed")
            .expect("user exists");
        let mut active = user.into_active_model();
        active.role = Set(Role::Admin);
        active.update(db).await.expect("Failed to promote user");
    }

    /// `Authorization` header value for `token`.
    pub fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value")
    }

    /// Create a catalog card through the API and return its ID.
    pub async fn create_card(server: &TestServer, token: &str, name: &str, quantity: i32) -> i64 {
        let response = server
            .post("/api/v1/cards")
            .add_header(AUTHORIZATION, bearer(token))
            .json(&json!({
                "card_name": name,
                "card_image": format!("{}.png", name.to_lowercase()),
                "card_quantity": quantity,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        body["data"]["id"].as_i64().expect("card id")
    }
}
