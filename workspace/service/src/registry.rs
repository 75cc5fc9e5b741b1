//! Card-ownership registry: links users to (card, card number) pairs.
//!
//! A (card_id, card_number) pair is held by at most one live registration.
//! Every write goes through [`validate_no_duplicate`]; the partial unique
//! index on `card_owners` backs it up, and its violations surface as the same
//! `DuplicateRegistration` error.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use model::entities::prelude::{Card, CardOwner};
use model::entities::{card, card_owner, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, error, info, instrument, warn};

use crate::access::{require_admin, validate_user_access};
use crate::error::{Result, ServiceError};

/// A registration together with the catalog card it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerWithCard {
    pub owner: card_owner::Model,
    pub card: card::Model,
}

/// Owner-identity fields shared by a single registration and a batch.
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    pub id_card: String,
    pub phone_number: String,
}

/// One (card, card number) pair to register.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardRef {
    pub card_id: i32,
    pub card_number: String,
}

/// Partial registration update. `None`, empty strings and a zero card ID
/// leave the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct OwnerUpdate {
    pub card_id: Option<i32>,
    pub card_number: Option<String>,
    pub id_card: Option<String>,
    pub phone_number: Option<String>,
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn duplicate(card_id: i32, card_number: &str) -> ServiceError {
    ServiceError::DuplicateRegistration {
        card_id,
        card_number: card_number.to_string(),
    }
}

/// Fails unless `card_id` is a live catalog card and no live registration
/// other than `exclude_owner_id` holds `(card_id, card_number)`.
#[instrument(skip(db))]
pub async fn validate_no_duplicate<C>(
    db: &C,
    card_id: i32,
    card_number: &str,
    exclude_owner_id: Option<i32>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if Card::find_live_by_id(card_id).one(db).await?.is_none() {
        warn!(card_id, "Card is not in the catalog");
        return Err(ServiceError::CardNotInCatalog(card_id));
    }

    let mut query = CardOwner::find_live_by_card_and_number(card_id, card_number);
    if let Some(owner_id) = exclude_owner_id {
        query = query.filter(card_owner::Column::Id.ne(owner_id));
    }

    if let Some(existing) = query.one(db).await? {
        warn!(
            card_id,
            card_number,
            existing_owner_id = existing.id,
            "Card number already registered"
        );
        return Err(duplicate(card_id, card_number));
    }

    debug!(card_id, card_number, "No duplicate registration");
    Ok(())
}

/// Pre-flight duplicate check for an authenticated caller.
#[instrument(skip(db))]
pub async fn check_duplicate(
    db: &DatabaseConnection,
    user_id: i32,
    card_id: i32,
    card_number: &str,
) -> Result<()> {
    validate_user_access(db, user_id).await?;
    validate_no_duplicate(db, card_id, card_number, None).await
}

async fn insert_owner<C>(
    db: &C,
    user_id: i32,
    card: &CardRef,
    identity: &OwnerIdentity,
) -> Result<card_owner::Model>
where
    C: ConnectionTrait,
{
    card_owner::ActiveModel {
        card_id: Set(card.card_id),
        card_number: Set(card.card_number.clone()),
        id_card: Set(identity.id_card.clone()),
        phone_number: Set(identity.phone_number.clone()),
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| ServiceError::unique_violation_or(e, duplicate(card.card_id, &card.card_number)))
}

#[instrument(skip(db, identity))]
pub async fn register_owner(
    db: &DatabaseConnection,
    user_id: i32,
    card: CardRef,
    identity: OwnerIdentity,
) -> Result<card_owner::Model> {
    validate_user_access(db, user_id).await?;
    validate_no_duplicate(db, card.card_id, &card.card_number, None).await?;

    let created = insert_owner(db, user_id, &card, &identity).await?;
    info!(owner_id = created.id, card_id = card.card_id, "Card owner registered");
    Ok(created)
}

/// Registers several cards for one owner identity. Either every item is
/// stored or none is.
#[instrument(skip(db, cards, identity), fields(count = cards.len()))]
pub async fn register_multiple(
    db: &DatabaseConnection,
    user_id: i32,
    cards: Vec<CardRef>,
    identity: OwnerIdentity,
) -> Result<Vec<card_owner::Model>> {
    validate_user_access(db, user_id).await?;

    if cards.is_empty() {
        warn!("Empty batch registration");
        return Err(ServiceError::EmptyBatch);
    }

    let txn = db.begin().await?;

    let mut seen = HashSet::new();
    for card in &cards {
        if !seen.insert(card) {
            warn!(card_id = card.card_id, card_number = %card.card_number, "Duplicate inside batch");
            return Err(duplicate(card.card_id, &card.card_number));
        }
        validate_no_duplicate(&txn, card.card_id, &card.card_number, None).await?;
    }

    let mut created = Vec::with_capacity(cards.len());
    for card in &cards {
        created.push(insert_owner(&txn, user_id, card, &identity).await?);
    }

    txn.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit batch registration");
        ServiceError::Database(e)
    })?;

    info!(count = created.len(), "Card owners registered in batch");
    Ok(created)
}

async fn find_owned(
    db: &DatabaseConnection,
    user_id: i32,
    owner_id: i32,
) -> Result<card_owner::Model> {
    let owner = CardOwner::find_live_by_id(owner_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            warn!(owner_id, "Card owner not found");
            ServiceError::OwnerNotFound
        })?;

    if owner.user_id != user_id {
        warn!(owner_id, user_id, "Card owner belongs to another user");
        return Err(ServiceError::NotOwner);
    }
    Ok(owner)
}

#[instrument(skip(db))]
pub async fn update_owner(
    db: &DatabaseConnection,
    user_id: i32,
    owner_id: i32,
    update: OwnerUpdate,
) -> Result<card_owner::Model> {
    validate_user_access(db, user_id).await?;
    let existing = find_owned(db, user_id, owner_id).await?;

    let new_card_id = update.card_id.filter(|id| *id > 0);
    let new_card_number = supplied(update.card_number);
    let relocating = new_card_id.is_some() || new_card_number.is_some();

    let card_id = new_card_id.unwrap_or(existing.card_id);
    let card_number = new_card_number.unwrap_or_else(|| existing.card_number.clone());
    if relocating {
        validate_no_duplicate(db, card_id, &card_number, Some(owner_id)).await?;
    }

    let mut active = existing.into_active_model();
    active.card_id = Set(card_id);
    active.card_number = Set(card_number.clone());
    if let Some(id_card) = supplied(update.id_card) {
        active.id_card = Set(id_card);
    }
    if let Some(phone_number) = supplied(update.phone_number) {
        active.phone_number = Set(phone_number);
    }

    let updated = active
        .update(db)
        .await
        .map_err(|e| ServiceError::unique_violation_or(e, duplicate(card_id, &card_number)))?;

    info!(owner_id, "Card owner updated");
    Ok(updated)
}

/// Tombstones a registration, which frees its (card, card number) pair.
#[instrument(skip(db))]
pub async fn delete_owner(db: &DatabaseConnection, user_id: i32, owner_id: i32) -> Result<()> {
    validate_user_access(db, user_id).await?;
    let existing = find_owned(db, user_id, owner_id).await?;

    let mut active = existing.into_active_model();
    active.deleted_at = Set(Some(Utc::now()));
    active.update(db).await?;

    info!(owner_id, "Card owner deleted");
    Ok(())
}

/// Pairs every registration with its live card. Registrations whose card no
/// longer resolves are skipped.
async fn attach_cards(
    db: &DatabaseConnection,
    owners: Vec<card_owner::Model>,
) -> Result<Vec<OwnerWithCard>> {
    let card_ids: HashSet<i32> = owners.iter().map(|o| o.card_id).collect();
    if card_ids.is_empty() {
        return Ok(Vec::new());
    }

    let cards: HashMap<i32, card::Model> = Card::find_live()
        .filter(card::Column::Id.is_in(card_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(owners
        .into_iter()
        .filter_map(|owner| match cards.get(&owner.card_id) {
            Some(card) => Some(OwnerWithCard {
                card: card.clone(),
                owner,
            }),
            None => {
                debug!(owner_id = owner.id, card_id = owner.card_id, "Skipping registration with missing card");
                None
            }
        })
        .collect())
}

/// Registrations visible to `user`: every one for admins, otherwise their own.
async fn scoped_owners(db: &DatabaseConnection, user: &user::Model) -> Result<Vec<card_owner::Model>> {
    let query = if user.is_admin() {
        CardOwner::find_live()
    } else {
        CardOwner::find_live_by_user(user.id)
    };
    Ok(query.order_by_asc(card_owner::Column::Id).all(db).await?)
}

#[instrument(skip(db))]
pub async fn list_for_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<OwnerWithCard>> {
    validate_user_access(db, user_id).await?;
    let owners = CardOwner::find_live_by_user(user_id)
        .order_by_asc(card_owner::Column::Id)
        .all(db)
        .await?;
    attach_cards(db, owners).await
}

#[instrument(skip(db))]
pub async fn list_all(db: &DatabaseConnection, user_id: i32) -> Result<Vec<OwnerWithCard>> {
    let user = validate_user_access(db, user_id).await?;
    require_admin(&user)?;

    let owners = CardOwner::find_live()
        .order_by_asc(card_owner::Column::Id)
        .all(db)
        .await?;
    attach_cards(db, owners).await
}

/// Filters visible registrations by card name (case-insensitive substring)
/// and card number (substring). Both filters apply when both are non-empty;
/// an empty filter matches everything.
#[instrument(skip(db))]
pub async fn search_by_card(
    db: &DatabaseConnection,
    user_id: i32,
    card_name: &str,
    card_number: &str,
) -> Result<Vec<OwnerWithCard>> {
    let user = validate_user_access(db, user_id).await?;
    let name = card_name.trim().to_lowercase();
    let number = card_number.trim();

    let rows = attach_cards(db, scoped_owners(db, &user).await?).await?;
    let matches: Vec<OwnerWithCard> = rows
        .into_iter()
        .filter(|row| name.is_empty() || row.card.card_name.to_lowercase().contains(&name))
        .filter(|row| number.is_empty() || row.owner.card_number.contains(number))
        .collect();

    debug!(count = matches.len(), "Card search completed");
    Ok(matches)
}

/// Filters visible registrations by ID card (case-insensitive substring) or
/// phone number (substring). A row matches when any supplied pattern matches;
/// empty patterns do not take part. At least one pattern is required.
#[instrument(skip(db))]
pub async fn search_by_owner_identity(
    db: &DatabaseConnection,
    user_id: i32,
    id_card: &str,
    phone_number: &str,
) -> Result<Vec<OwnerWithCard>> {
    let user = validate_user_access(db, user_id).await?;
    let id_card = id_card.trim().to_lowercase();
    let phone = phone_number.trim();

    if id_card.is_empty() && phone.is_empty() {
        warn!("Owner search without parameters");
        return Err(ServiceError::NoSearchParameter);
    }

    let owners: Vec<card_owner::Model> = scoped_owners(db, &user)
        .await?
        .into_iter()
        .filter(|owner| {
            (!id_card.is_empty() && owner.id_card.to_lowercase().contains(&id_card))
                || (!phone.is_empty() && owner.phone_number.contains(phone))
        })
        .collect();

    let matches = attach_cards(db, owners).await?;
    debug!(count = matches.len(), "Owner search completed");
    Ok(matches)
}
