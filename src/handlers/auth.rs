use crate::error::{service_error, ApiError};
use crate::handlers::users::UserResponse;
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use serde::{Deserialize, Serialize};
use service::credentials::{self, NewUser};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating an account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    /// Username (must be unique)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Plaintext password, at least 6 characters
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Access token for the `Authorization: Bearer` header
    pub token: String,
    /// Longer-lived token accepted by the refresh endpoint
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    /// Newly issued access token
    pub token: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username is already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering register function");
    debug!("Registering user with first name: {}, last name: {}", request.first_name, request.last_name);

    let new_user = NewUser {
        username: request.username,
        password: request.password,
        first_name: request.first_name,
        last_name: request.last_name,
    };

    match credentials::register(&state.db, new_user).await {
        Ok(user) => {
            info!("User registered successfully with ID: {}", user.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(UserResponse::from(user), "User registered successfully")),
            ))
        }
        Err(e) => {
            warn!("Registration failed: {}", e);
            Err(service_error(e))
        }
    }
}

/// Log in and obtain an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 403, description = "Account is deactivated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<LoginRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResponse>>), ApiError> {
    trace!("Entering login function");

    let outcome = credentials::login(&state.db, &state.tokens, &request.username, &request.password)
        .await
        .map_err(service_error)?;

    info!("User {} logged in", outcome.user.id);
    let response = LoginResponse {
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl().num_seconds(),
        user: UserResponse::from(outcome.user),
    };
    Ok((StatusCode::OK, Json(ApiResponse::new(response, "Login successful"))))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = ApiResponse<RefreshTokenResponse>),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RefreshTokenRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<RefreshTokenResponse>>), ApiError> {
    trace!("Entering refresh_token function");

    let token = state.tokens.refresh(&request.refresh_token).map_err(service_error)?;

    debug!("Issued refreshed access token");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(RefreshTokenResponse { token }, "Token refreshed successfully")),
    ))
}
