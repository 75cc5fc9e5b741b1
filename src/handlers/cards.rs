use crate::auth::AuthUser;
use crate::error::{service_error, ApiError};
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::card;
use serde::{Deserialize, Serialize};
use service::catalog::{self, CardUpdate, NewCard};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a catalog card
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCardRequest {
    /// Card name (unique among live cards)
    #[validate(length(min = 1, max = 255))]
    pub card_name: String,
    /// Image reference (URL or file name)
    #[validate(length(min = 1))]
    pub card_image: String,
    /// Available quantity, zero when omitted
    pub card_quantity: Option<i32>,
}

/// Request body for updating a catalog card. Omitted fields are unchanged.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCardRequest {
    #[validate(length(max = 255))]
    pub card_name: Option<String>,
    pub card_image: Option<String>,
    pub card_quantity: Option<i32>,
}

/// Card response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardResponse {
    pub id: i32,
    pub card_name: String,
    pub card_image: String,
    pub card_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<card::Model> for CardResponse {
    fn from(model: card::Model) -> Self {
        Self {
            id: model.id,
            card_name: model.card_name,
            card_image: model.card_image,
            card_quantity: model.card_quantity,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Get all cards
#[utoipa::path(
    get,
    path = "/api/v1/cards",
    tag = "cards",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cards retrieved successfully", body = ApiResponse<Vec<CardResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_cards(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CardResponse>>>), ApiError> {
    trace!("Entering get_cards function");

    let cards = catalog::get_all(&state.db, auth.user_id)
        .await
        .map_err(service_error)?;

    let card_count = cards.len();
    debug!("Retrieved {} cards from database", card_count);
    let data: Vec<CardResponse> = cards.into_iter().map(CardResponse::from).collect();

    info!("Successfully retrieved {} cards", card_count);
    Ok((StatusCode::OK, Json(ApiResponse::new(data, "Cards retrieved successfully"))))
}

/// Get a card by ID
#[utoipa::path(
    get,
    path = "/api/v1/cards/{card_id}",
    tag = "cards",
    security(("bearer_auth" = [])),
    params(
        ("card_id" = i32, Path, description = "Card ID"),
    ),
    responses(
        (status = 200, description = "Card retrieved successfully", body = ApiResponse<CardResponse>),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_card(
    Path(card_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<CardResponse>>), ApiError> {
    trace!("Entering get_card function for card_id: {}", card_id);

    match catalog::get_by_id(&state.db, auth.user_id, card_id).await {
        Ok(card) => {
            debug!("Retrieved card {} ({})", card.id, card.card_name);
            Ok((
                StatusCode::OK,
                Json(ApiResponse::new(CardResponse::from(card), "Card retrieved successfully")),
            ))
        }
        Err(e) => {
            warn!("Failed to retrieve card {}: {}", card_id, e);
            Err(service_error(e))
        }
    }
}

/// Get a card by its exact name
#[utoipa::path(
    get,
    path = "/api/v1/cards/by-name/{card_name}",
    tag = "cards",
    security(("bearer_auth" = [])),
    params(
        ("card_name" = String, Path, description = "Exact card name"),
    ),
    responses(
        (status = 200, description = "Card retrieved successfully", body = ApiResponse<CardResponse>),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_card_by_name(
    Path(card_name): Path<String>,
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<CardResponse>>), ApiError> {
    trace!("Entering get_card_by_name function for card_name: {}", card_name);

    let card = catalog::get_by_name(&state.db, auth.user_id, &card_name)
        .await
        .map_err(service_error)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(CardResponse::from(card), "Card retrieved successfully")),
    ))
}

/// Create a catalog card
#[utoipa::path(
    post,
    path = "/api/v1/cards",
    tag = "cards",
    security(("bearer_auth" = [])),
    request_body = CreateCardRequest,
    responses(
        (status = 201, description = "Card created successfully", body = ApiResponse<CardResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Card name already exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<CreateCardRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CardResponse>>), ApiError> {
    trace!("Entering create_card function");
    debug!("Creating card with name: {}", request.card_name);

    let new_card = NewCard {
        card_name: request.card_name,
        card_image: request.card_image,
        card_quantity: request.card_quantity.unwrap_or(0),
    };

    match catalog::create(&state.db, auth.user_id, new_card).await {
        Ok(card) => {
            info!("Card created successfully with ID: {}, name: {}", card.id, card.card_name);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(CardResponse::from(card), "Card created successfully")),
            ))
        }
        Err(e) => {
            warn!("Failed to create card: {}", e);
            Err(service_error(e))
        }
    }
}

/// Update a catalog card
#[utoipa::path(
    put,
    path = "/api/v1/cards/{card_id}",
    tag = "cards",
    security(("bearer_auth" = [])),
    params(
        ("card_id" = i32, Path, description = "Card ID"),
    ),
    request_body = UpdateCardRequest,
    responses(
        (status = 200, description = "Card updated successfully", body = ApiResponse<CardResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse),
        (status = 409, description = "Card name already exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_card(
    Path(card_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<UpdateCardRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CardResponse>>), ApiError> {
    trace!("Entering update_card function for card_id: {}", card_id);
    debug!("Update request: {:?}", request);

    let update = CardUpdate {
        card_name: request.card_name,
        card_image: request.card_image,
        card_quantity: request.card_quantity,
    };

    let card = catalog::update(&state.db, auth.user_id, card_id, update)
        .await
        .map_err(service_error)?;

    info!("Card {} updated", card.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(CardResponse::from(card), "Card updated successfully")),
    ))
}

/// Delete a catalog card
#[utoipa::path(
    delete,
    path = "/api/v1/cards/{card_id}",
    tag = "cards",
    security(("bearer_auth" = [])),
    params(
        ("card_id" = i32, Path, description = "Card ID"),
    ),
    responses(
        (status = 200, description = "Card deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Card not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_card(
    Path(card_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    trace!("Entering delete_card function for card_id: {}", card_id);

    catalog::delete(&state.db, auth.user_id, card_id)
        .await
        .map_err(service_error)?;

    info!("Card {} deleted", card_id);
    Ok((StatusCode::OK, Json(ApiResponse::new((), "Card deleted successfully"))))
}
