use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

/// Error types for the card registry core.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("Account is deactivated")]
    Deactivated,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Card not found")]
    CardNotFound,

    #[error("Card quantity cannot be negative")]
    NegativeQuantity,

    #[error("Card name already exists")]
    DuplicateCardName,

    /// The referenced card does not exist in the catalog.
    #[error("Card ID {0} not found in master data")]
    CardNotInCatalog(i32),

    /// The (card, card number) pair is already registered.
    #[error("Card number {card_number} is already registered for card ID {card_id}")]
    DuplicateRegistration { card_id: i32, card_number: String },

    #[error("Card owner not found")]
    OwnerNotFound,

    #[error("Card owner belongs to another user")]
    NotOwner,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("At least one search parameter (ID card or phone number) must be provided")]
    NoSearchParameter,

    #[error("At least one card must be supplied")]
    EmptyBatch,

    /// Password hashing failed. The inner message is only logged.
    #[error("Failed to hash password")]
    HashFailure(String),

    /// Token signing failed. The inner message is only logged.
    #[error("Failed to issue token")]
    TokenIssuance(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ServiceError {
    /// Maps a storage error to `on_unique` when it is a unique-constraint
    /// violation, otherwise wraps it as a database error.
    pub fn unique_violation_or(err: DbErr, on_unique: ServiceError) -> ServiceError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::warn!(%detail, "Unique constraint violation");
                on_unique
            }
            _ => {
                error!(error = %err, "Database operation failed");
                ServiceError::Database(err)
            }
        }
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
