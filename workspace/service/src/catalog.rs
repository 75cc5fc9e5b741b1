//! Card catalog: the master data every registration points at.

use chrono::Utc;
use model::entities::card;
use model::entities::prelude::Card;
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, QueryOrder, Set};
use tracing::{debug, info, instrument, warn};

use crate::access::validate_user_access;
use crate::error::{Result, ServiceError};

#[derive(Debug, Clone)]
pub struct NewCard {
    pub card_name: String,
    pub card_image: String,
    pub card_quantity: i32,
}

/// Partial card update. Empty strings count as "not supplied"; a quantity of
/// `Some(0)` is a real value.
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub card_name: Option<String>,
    pub card_image: Option<String>,
    pub card_quantity: Option<i32>,
}

fn check_quantity(quantity: i32) -> Result<()> {
    if quantity < 0 {
        warn!(quantity, "Rejected negative card quantity");
        return Err(ServiceError::NegativeQuantity);
    }
    Ok(())
}

async fn name_in_use(db: &DatabaseConnection, card_name: &str, except_id: Option<i32>) -> Result<bool> {
    let existing = Card::find_live_by_name(card_name).one(db).await?;
    Ok(existing.is_some_and(|c| Some(c.id) != except_id))
}

async fn find_card(db: &DatabaseConnection, card_id: i32) -> Result<card::Model> {
    Card::find_live_by_id(card_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!(card_id, "Card not found");
            ServiceError::CardNotFound
        })
}

/// Writes a changed card. A rename onto a live name trips the partial unique
/// index and surfaces as `DuplicateCardName`.
async fn save_card(db: &DatabaseConnection, active: card::ActiveModel) -> Result<card::Model> {
    active
        .update(db)
        .await
        .map_err(|e| ServiceError::unique_violation_or(e, ServiceError::DuplicateCardName))
}

#[instrument(skip(db, new_card), fields(card_name = %new_card.card_name))]
pub async fn create(db: &DatabaseConnection, actor_id: i32, new_card: NewCard) -> Result<card::Model> {
    validate_user_access(db, actor_id).await?;
    check_quantity(new_card.card_quantity)?;

    if name_in_use(db, &new_card.card_name, None).await? {
        warn!("Card name already exists");
        return Err(ServiceError::DuplicateCardName);
    }

    let created = card::ActiveModel {
        card_name: Set(new_card.card_name),
        card_image: Set(new_card.card_image),
        card_quantity: Set(new_card.card_quantity),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| ServiceError::unique_violation_or(e, ServiceError::DuplicateCardName))?;

    info!(card_id = created.id, "Card created");
    Ok(created)
}

#[instrument(skip(db))]
pub async fn update(
    db: &DatabaseConnection,
    actor_id: i32,
    card_id: i32,
    update: CardUpdate,
) -> Result<card::Model> {
    validate_user_access(db, actor_id).await?;
    let existing = find_card(db, card_id).await?;
    let mut active = existing.into_active_model();

    if let Some(card_name) = update.card_name.filter(|n| !n.trim().is_empty()) {
        if name_in_use(db, &card_name, Some(card_id)).await? {
            warn!(%card_name, "Card name already exists");
            return Err(ServiceError::DuplicateCardName);
        }
        active.card_name = Set(card_name);
    }
    if let Some(card_image) = update.card_image.filter(|i| !i.trim().is_empty()) {
        active.card_image = Set(card_image);
    }
    if let Some(quantity) = update.card_quantity {
        check_quantity(quantity)?;
        active.card_quantity = Set(quantity);
    }

    let updated = save_card(db, active).await?;

    info!(card_id, "Card updated");
    Ok(updated)
}

/// Tombstones the card. Registrations pointing at it are hidden from listings.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, actor_id: i32, card_id: i32) -> Result<()> {
    validate_user_access(db, actor_id).await?;
    let existing = find_card(db, card_id).await?;

    let mut active = existing.into_active_model();
    active.deleted_at = Set(Some(Utc::now()));
    active.update(db).await?;

    info!(card_id, "Card deleted");
    Ok(())
}

#[instrument(skip(db))]
pub async fn get_all(db: &DatabaseConnection, actor_id: i32) -> Result<Vec<card::Model>> {
    validate_user_access(db, actor_id).await?;
    let cards = Card::find_live()
        .order_by_asc(card::Column::Id)
        .all(db)
        .await?;
    debug!(count = cards.len(), "Fetched cards");
    Ok(cards)
}

#[instrument(skip(db))]
pub async fn get_by_id(db: &DatabaseConnection, actor_id: i32, card_id: i32) -> Result<card::Model> {
    validate_user_access(db, actor_id).await?;
    find_card(db, card_id).await
}

#[instrument(skip(db))]
pub async fn get_by_name(
    db: &DatabaseConnection,
    actor_id: i32,
    card_name: &str,
) -> Result<card::Model> {
    validate_user_access(db, actor_id).await?;
    Card::find_live_by_name(card_name)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!(card_name, "Card not found by name");
            ServiceError::CardNotFound
        })
}
