use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::TokenIssuer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::handlers::{auth, card_owners, cards, users};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Signs and validates JWTs
    pub tokens: Arc<TokenIssuer>,
    /// Upper bound for handling a single request
    pub request_timeout: Duration,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh_token,
        crate::handlers::users::get_profile,
        crate::handlers::users::update_profile,
        crate::handlers::users::change_password,
        crate::handlers::cards::get_cards,
        crate::handlers::cards::get_card,
        crate::handlers::cards::get_card_by_name,
        crate::handlers::cards::create_card,
        crate::handlers::cards::update_card,
        crate::handlers::cards::delete_card,
        crate::handlers::card_owners::register_card_owner,
        crate::handlers::card_owners::register_multiple_cards,
        crate::handlers::card_owners::get_my_card_owners,
        crate::handlers::card_owners::get_all_card_owners,
        crate::handlers::card_owners::update_card_owner,
        crate::handlers::card_owners::delete_card_owner,
        crate::handlers::card_owners::validate_card_registration,
        crate::handlers::card_owners::search_by_card,
        crate::handlers::card_owners::search_by_owner,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshTokenRequest,
            auth::RefreshTokenResponse,
            users::UserResponse,
            users::UpdateProfileRequest,
            users::ChangePasswordRequest,
            cards::CreateCardRequest,
            cards::UpdateCardRequest,
            cards::CardResponse,
            card_owners::CreateCardOwnerRequest,
            card_owners::CardRegistration,
            card_owners::RegisterMultipleCardsRequest,
            card_owners::UpdateCardOwnerRequest,
            card_owners::ValidateCardRequest,
            card_owners::ValidationResult,
            card_owners::CardOwnerResponse,
            card_owners::CardOwnerWithCardResponse,
            card_owners::SearchResults,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "users", description = "Profile of the authenticated user"),
        (name = "cards", description = "Card catalog management"),
        (name = "card-owners", description = "Card registrations, duplicate checks and search"),
    ),
    info(
        title = "FastTrack API",
        description = "Card registry API - register cards and card owners against user accounts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
