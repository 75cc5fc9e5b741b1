use crate::auth::AuthUser;
use crate::error::{service_error, ApiError};
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::user;
use serde::{Deserialize, Serialize};
use service::credentials::{self, ProfileUpdate};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for updating the caller's profile. Omitted or empty name
/// fields are left unchanged; a supplied username follows the registration
/// length rules.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

/// User response model. The password hash is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// `user` or `admin`
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role.to_string(),
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering get_profile function for user_id: {}", auth.user_id);

    match credentials::get_profile(&state.db, auth.user_id).await {
        Ok(user) => {
            debug!("Retrieved profile for user {}", user.username);
            Ok((
                StatusCode::OK,
                Json(ApiResponse::new(UserResponse::from(user), "Profile retrieved successfully")),
            ))
        }
        Err(e) => {
            warn!("Failed to retrieve profile for user {}: {}", auth.user_id, e);
            Err(service_error(e))
        }
    }
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 409, description = "Username is already taken", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<UpdateProfileRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering update_profile function for user_id: {}", auth.user_id);
    debug!("Update request: {:?}", request);

    let update = ProfileUpdate {
        username: request.username,
        first_name: request.first_name,
        last_name: request.last_name,
    };

    let user = credentials::update_profile(&state.db, auth.user_id, update)
        .await
        .map_err(service_error)?;

    info!("Profile updated for user {}", user.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(UserResponse::from(user), "Profile updated successfully")),
    ))
}

/// Change the authenticated user's password
#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = ApiResponse<String>),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<ChangePasswordRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    trace!("Entering change_password function for user_id: {}", auth.user_id);

    match credentials::change_password(
        &state.db,
        auth.user_id,
        &request.current_password,
        &request.new_password,
    )
    .await
    {
        Ok(()) => {
            info!("Password changed for user {}", auth.user_id);
            Ok((StatusCode::OK, Json(ApiResponse::new((), "Password changed successfully"))))
        }
        Err(e @ service::ServiceError::Database(_)) => {
            error!("Failed to change password for user {}: {}", auth.user_id, e);
            Err(service_error(e))
        }
        Err(e) => {
            warn!("Password change rejected for user {}: {}", auth.user_id, e);
            Err(service_error(e))
        }
    }
}
