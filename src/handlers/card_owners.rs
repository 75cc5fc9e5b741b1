use crate::auth::AuthUser;
use crate::error::{service_error, ApiError};
use crate::handlers::cards::CardResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::card_owner;
use serde::{Deserialize, Serialize};
use service::registry::{self, CardRef, OwnerIdentity, OwnerUpdate, OwnerWithCard};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for registering one card to the caller
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCardOwnerRequest {
    /// Catalog card ID
    #[validate(range(min = 1))]
    pub card_id: i32,
    /// Card number, unique per catalog card
    #[validate(length(min = 1, max = 100))]
    pub card_number: String,
    /// National ID card number of the holder
    #[validate(length(min = 1, max = 100))]
    pub id_card: String,
    #[validate(length(min = 1, max = 50))]
    pub phone_number: String,
}

/// One card in a batch registration
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CardRegistration {
    #[validate(range(min = 1))]
    pub card_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub card_number: String,
}

/// Request body for registering several cards with one owner identity
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterMultipleCardsRequest {
    #[validate(length(min = 1))]
    pub cards: Vec<CardRegistration>,
    #[validate(length(min = 1, max = 100))]
    pub id_card: String,
    #[validate(length(min = 1, max = 50))]
    pub phone_number: String,
}

/// Request body for updating a registration. Omitted fields are unchanged.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCardOwnerRequest {
    pub card_id: Option<i32>,
    #[validate(length(max = 100))]
    pub card_number: Option<String>,
    #[validate(length(max = 100))]
    pub id_card: Option<String>,
    #[validate(length(max = 50))]
    pub phone_number: Option<String>,
}

/// Request body for the duplicate pre-check
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ValidateCardRequest {
    #[validate(range(min = 1))]
    pub card_id: i32,
    #[validate(length(min = 1))]
    pub card_number: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ValidationResult {
    pub duplicate: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CardSearchQuery {
    /// Case-insensitive substring of the card name
    pub card_name: Option<String>,
    /// Substring of the card number
    pub card_number: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OwnerSearchQuery {
    /// Case-insensitive substring of the ID card number
    pub id_card: Option<String>,
    /// Substring of the phone number
    pub phone_number: Option<String>,
}

/// Card owner response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardOwnerResponse {
    pub id: i32,
    pub card_id: i32,
    pub card_number: String,
    pub id_card: String,
    pub phone_number: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<card_owner::Model> for CardOwnerResponse {
    fn from(model: card_owner::Model) -> Self {
        Self {
            id: model.id,
            card_id: model.card_id,
            card_number: model.card_number,
            id_card: model.id_card,
            phone_number: model.phone_number,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A registration with its catalog card
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardOwnerWithCardResponse {
    pub id: i32,
    pub card_id: i32,
    pub card_number: String,
    pub id_card: String,
    pub phone_number: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub card: CardResponse,
}

impl From<OwnerWithCard> for CardOwnerWithCardResponse {
    fn from(row: OwnerWithCard) -> Self {
        let owner = row.owner;
        Self {
            id: owner.id,
            card_id: owner.card_id,
            card_number: owner.card_number,
            id_card: owner.id_card,
            phone_number: owner.phone_number,
            user_id: owner.user_id,
            created_at: owner.created_at,
            updated_at: owner.updated_at,
            card: CardResponse::from(row.card),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResults {
    pub results: Vec<CardOwnerWithCardResponse>,
    pub count: usize,
}

impl From<Vec<OwnerWithCard>> for SearchResults {
    fn from(rows: Vec<OwnerWithCard>) -> Self {
        let results: Vec<CardOwnerWithCardResponse> =
            rows.into_iter().map(CardOwnerWithCardResponse::from).collect();
        Self {
            count: results.len(),
            results,
        }
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Register a card to the authenticated user
#[utoipa::path(
    post,
    path = "/api/v1/card-owners",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    request_body = CreateCardOwnerRequest,
    responses(
        (status = 201, description = "Card owner registered successfully", body = ApiResponse<CardOwnerResponse>),
        (status = 400, description = "Invalid request or unknown card", body = ErrorResponse),
        (status = 409, description = "Card number already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register_card_owner(
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<CreateCardOwnerRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CardOwnerResponse>>), ApiError> {
    trace!("Entering register_card_owner function");
    debug!("Registering card {} number {}", request.card_id, request.card_number);

    let card = CardRef {
        card_id: request.card_id,
        card_number: request.card_number,
    };
    let identity = OwnerIdentity {
        id_card: request.id_card,
        phone_number: request.phone_number,
    };

    match registry::register_owner(&state.db, auth.user_id, card, identity).await {
        Ok(owner) => {
            info!("Card owner registered successfully with ID: {}", owner.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(
                    CardOwnerResponse::from(owner),
                    "Card owner registered successfully",
                )),
            ))
        }
        Err(e) => {
            warn!("Card owner registration failed: {}", e);
            Err(service_error(e))
        }
    }
}

/// Register several cards to the authenticated user in one transaction
#[utoipa::path(
    post,
    path = "/api/v1/card-owners/batch",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    request_body = RegisterMultipleCardsRequest,
    responses(
        (status = 201, description = "Cards registered successfully", body = ApiResponse<Vec<CardOwnerResponse>>),
        (status = 400, description = "Invalid request or unknown card", body = ErrorResponse),
        (status = 409, description = "A card number is already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(count = request.cards.len()))]
pub async fn register_multiple_cards(
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<RegisterMultipleCardsRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CardOwnerResponse>>>), ApiError> {
    trace!("Entering register_multiple_cards function");

    let cards: Vec<CardRef> = request
        .cards
        .into_iter()
        .map(|c| CardRef {
            card_id: c.card_id,
            card_number: c.card_number,
        })
        .collect();
    let identity = OwnerIdentity {
        id_card: request.id_card,
        phone_number: request.phone_number,
    };

    let owners = registry::register_multiple(&state.db, auth.user_id, cards, identity)
        .await
        .map_err(service_error)?;

    info!("Registered {} cards in batch", owners.len());
    let data: Vec<CardOwnerResponse> = owners.into_iter().map(CardOwnerResponse::from).collect();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(data, "Multiple cards registered successfully")),
    ))
}

/// List the authenticated user's registrations
#[utoipa::path(
    get,
    path = "/api/v1/card-owners",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card owners retrieved successfully", body = ApiResponse<Vec<CardOwnerWithCardResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_my_card_owners(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CardOwnerWithCardResponse>>>), ApiError> {
    trace!("Entering get_my_card_owners function");

    let rows = registry::list_for_user(&state.db, auth.user_id)
        .await
        .map_err(service_error)?;

    debug!("Retrieved {} card owners for user {}", rows.len(), auth.user_id);
    let data: Vec<CardOwnerWithCardResponse> =
        rows.into_iter().map(CardOwnerWithCardResponse::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(data, "Card owners retrieved successfully"))))
}

/// List every registration (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/card-owners/all",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Card owners retrieved successfully", body = ApiResponse<Vec<CardOwnerWithCardResponse>>),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_all_card_owners(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CardOwnerWithCardResponse>>>), ApiError> {
    trace!("Entering get_all_card_owners function");

    match registry::list_all(&state.db, auth.user_id).await {
        Ok(rows) => {
            info!("Admin {} retrieved {} card owners", auth.user_id, rows.len());
            let data: Vec<CardOwnerWithCardResponse> =
                rows.into_iter().map(CardOwnerWithCardResponse::from).collect();
            Ok((StatusCode::OK, Json(ApiResponse::new(data, "All card owners retrieved successfully"))))
        }
        Err(e) => {
            warn!("Listing all card owners refused for user {}: {}", auth.user_id, e);
            Err(service_error(e))
        }
    }
}

/// Update one of the authenticated user's registrations
#[utoipa::path(
    put,
    path = "/api/v1/card-owners/{owner_id}",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    params(
        ("owner_id" = i32, Path, description = "Card owner ID"),
    ),
    request_body = UpdateCardOwnerRequest,
    responses(
        (status = 200, description = "Card owner updated successfully", body = ApiResponse<CardOwnerResponse>),
        (status = 403, description = "Card owner belongs to another user", body = ErrorResponse),
        (status = 404, description = "Card owner not found", body = ErrorResponse),
        (status = 409, description = "Card number already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_card_owner(
    Path(owner_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<UpdateCardOwnerRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CardOwnerResponse>>), ApiError> {
    trace!("Entering update_card_owner function for owner_id: {}", owner_id);
    debug!("Update request: {:?}", request);

    let update = OwnerUpdate {
        card_id: request.card_id,
        card_number: request.card_number,
        id_card: request.id_card,
        phone_number: request.phone_number,
    };

    let owner = registry::update_owner(&state.db, auth.user_id, owner_id, update)
        .await
        .map_err(service_error)?;

    info!("Card owner {} updated", owner.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(CardOwnerResponse::from(owner), "Card owner updated successfully")),
    ))
}

/// Delete one of the authenticated user's registrations
#[utoipa::path(
    delete,
    path = "/api/v1/card-owners/{owner_id}",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    params(
        ("owner_id" = i32, Path, description = "Card owner ID"),
    ),
    responses(
        (status = 200, description = "Card owner deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Card owner belongs to another user", body = ErrorResponse),
        (status = 404, description = "Card owner not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_card_owner(
    Path(owner_id): Path<i32>,
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    trace!("Entering delete_card_owner function for owner_id: {}", owner_id);

    registry::delete_owner(&state.db, auth.user_id, owner_id)
        .await
        .map_err(service_error)?;

    info!("Card owner {} deleted", owner_id);
    Ok((StatusCode::OK, Json(ApiResponse::new((), "Card owner deleted successfully"))))
}

/// Check whether a card number is free before registering it
#[utoipa::path(
    post,
    path = "/api/v1/card-owners/validate",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    request_body = ValidateCardRequest,
    responses(
        (status = 200, description = "Card registration is valid", body = ApiResponse<ValidationResult>),
        (status = 400, description = "Unknown card", body = ErrorResponse),
        (status = 409, description = "Duplicate card registration", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn validate_card_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    Valid(Json(request)): Valid<Json<ValidateCardRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ValidationResult>>), ApiError> {
    trace!("Entering validate_card_registration function");
    debug!("Checking card {} number {}", request.card_id, request.card_number);

    registry::check_duplicate(&state.db, auth.user_id, request.card_id, &request.card_number)
        .await
        .map_err(service_error)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(
            ValidationResult { duplicate: false },
            "Card registration is valid",
        )),
    ))
}

/// Search registrations by card name and/or card number
#[utoipa::path(
    get,
    path = "/api/v1/card-owners/search/card",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    params(CardSearchQuery),
    responses(
        (status = 200, description = "Search completed successfully", body = ApiResponse<SearchResults>),
        (status = 400, description = "No search parameter supplied", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_by_card(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CardSearchQuery>,
) -> Result<(StatusCode, Json<ApiResponse<SearchResults>>), ApiError> {
    trace!("Entering search_by_card function");

    let card_name = trimmed(query.card_name);
    let card_number = trimmed(query.card_number);
    if card_name.is_empty() && card_number.is_empty() {
        warn!("Card search without parameters");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "NO_SEARCH_PARAMETER",
                "At least one search parameter (card_name or card_number) must be provided",
            )),
        ));
    }

    let rows = registry::search_by_card(&state.db, auth.user_id, &card_name, &card_number)
        .await
        .map_err(service_error)?;

    let results = SearchResults::from(rows);
    info!("Card search returned {} results", results.count);
    Ok((StatusCode::OK, Json(ApiResponse::new(results, "Search completed successfully"))))
}

/// Search registrations by ID card or phone number
#[utoipa::path(
    get,
    path = "/api/v1/card-owners/search/owner",
    tag = "card-owners",
    security(("bearer_auth" = [])),
    params(OwnerSearchQuery),
    responses(
        (status = 200, description = "Search completed successfully", body = ApiResponse<SearchResults>),
        (status = 400, description = "No search parameter supplied", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_by_owner(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<OwnerSearchQuery>,
) -> Result<(StatusCode, Json<ApiResponse<SearchResults>>), ApiError> {
    trace!("Entering search_by_owner function");

    let id_card = trimmed(query.id_card);
    let phone_number = trimmed(query.phone_number);

    let rows = registry::search_by_owner_identity(&state.db, auth.user_id, &id_card, &phone_number)
        .await
        .map_err(service_error)?;

    let results = SearchResults::from(rows);
    info!("Owner search returned {} results", results.count);
    Ok((StatusCode::OK, Json(ApiResponse::new(results, "Search completed successfully"))))
}
