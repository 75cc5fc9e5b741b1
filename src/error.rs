use axum::{http::StatusCode, response::Json};
use service::ServiceError;
use tracing::error;

use crate::schemas::ErrorResponse;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a domain error to its HTTP status and error code. Internal failures
/// are logged here and reported with a generic message.
pub fn service_error(err: ServiceError) -> ApiError {
    let (status, code) = match &err {
        ServiceError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
        ServiceError::Deactivated => (StatusCode::FORBIDDEN, "ACCOUNT_DEACTIVATED"),
        ServiceError::UsernameTaken => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
        ServiceError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        ServiceError::WrongCurrentPassword => (StatusCode::BAD_REQUEST, "WRONG_CURRENT_PASSWORD"),
        ServiceError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
        ServiceError::ExpiredToken => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
        ServiceError::InvalidRefreshToken => (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN"),
        ServiceError::CardNotFound => (StatusCode::NOT_FOUND, "CARD_NOT_FOUND"),
        ServiceError::NegativeQuantity => (StatusCode::BAD_REQUEST, "NEGATIVE_QUANTITY"),
        ServiceError::DuplicateCardName => (StatusCode::CONFLICT, "DUPLICATE_CARD_NAME"),
        ServiceError::CardNotInCatalog(_) => (StatusCode::BAD_REQUEST, "CARD_NOT_IN_CATALOG"),
        ServiceError::DuplicateRegistration { .. } => {
            (StatusCode::CONFLICT, "DUPLICATE_REGISTRATION")
        }
        ServiceError::OwnerNotFound => (StatusCode::NOT_FOUND, "CARD_OWNER_NOT_FOUND"),
        ServiceError::NotOwner => (StatusCode::FORBIDDEN, "NOT_OWNER"),
        ServiceError::InsufficientPermissions => {
            (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSIONS")
        }
        ServiceError::NoSearchParameter => (StatusCode::BAD_REQUEST, "NO_SEARCH_PARAMETER"),
        ServiceError::EmptyBatch => (StatusCode::BAD_REQUEST, "EMPTY_BATCH"),
        ServiceError::HashFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "HASH_FAILURE"),
        ServiceError::TokenIssuance(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ISSUANCE_FAILURE")
        }
        ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = ?err, code, "Internal error while handling request");
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    (status, Json(ErrorResponse::new(code, message)))
}
