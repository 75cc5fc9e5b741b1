use model::entities::{card, card_owner};
use model::entities::prelude::{Card, CardOwner};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use crate::entity_iden::EntityIden;

/// Uniqueness only applies to rows without a `deleted_at` tombstone, so a
/// deleted card name or card registration can be used again. Partial indexes
/// are not expressible through the schema builder, hence the raw statements.
#[derive(DeriveMigrationName)]
pub struct Migration;

const CARD_NAME_INDEX: &str = "uq_cards_card_name_live";
const CARD_NUMBER_INDEX: &str = "uq_card_owners_card_id_card_number_live";
const ID_CARD_INDEX: &str = "idx_card_owners_id_card";
const OWNER_USER_INDEX: &str = "idx_card_owners_user_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({}) WHERE {} IS NULL",
            CARD_NAME_INDEX,
            Card::table().as_str(),
            Card::column(card::Column::CardName).as_str(),
            Card::column(card::Column::DeletedAt).as_str(),
        ))
        .await?;

        db.execute_unprepared(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({}, {}) WHERE {} IS NULL",
            CARD_NUMBER_INDEX,
            CardOwner::table().as_str(),
            CardOwner::column(card_owner::Column::CardId).as_str(),
            CardOwner::column(card_owner::Column::CardNumber).as_str(),
            CardOwner::column(card_owner::Column::DeletedAt).as_str(),
        ))
        .await?;

        // Lookup indexes for owner searches and per-user listings
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(ID_CARD_INDEX)
                    .table(CardOwner::table())
                    .col(CardOwner::column(card_owner::Column::IdCard))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(OWNER_USER_INDEX)
                    .table(CardOwner::table())
                    .col(CardOwner::column(card_owner::Column::UserId))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            (OWNER_USER_INDEX, CardOwner::table()),
            (ID_CARD_INDEX, CardOwner::table()),
            (CARD_NUMBER_INDEX, CardOwner::table()),
            (CARD_NAME_INDEX, Card::table()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}
