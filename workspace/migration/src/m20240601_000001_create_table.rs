use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::FirstName))
                    .col(string(Users::LastName))
                    .col(string_len(Users::Role, 20).default("user"))
                    .col(boolean(Users::IsActive).default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .col(timestamp_with_time_zone_null(Users::DeletedAt))
                    .to_owned(),
            )
            .await?;

        // Create cards table (catalog); name uniqueness lives in the next migration
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(pk_auto(Cards::Id))
                    .col(string(Cards::CardName))
                    .col(string(Cards::CardImage))
                    .col(integer(Cards::CardQuantity).default(0))
                    .col(timestamp_with_time_zone(Cards::CreatedAt))
                    .col(timestamp_with_time_zone(Cards::UpdatedAt))
                    .col(timestamp_with_time_zone_null(Cards::DeletedAt))
                    .to_owned(),
            )
            .await?;

        // Create card_owners table
        manager
            .create_table(
                Table::create()
                    .table(CardOwners::Table)
                    .if_not_exists()
                    .col(pk_auto(CardOwners::Id))
                    .col(integer(CardOwners::CardId))
                    .col(string(CardOwners::CardNumber))
                    .col(string(CardOwners::IdCard))
                    .col(string(CardOwners::PhoneNumber))
                    .col(integer(CardOwners::UserId))
                    .col(timestamp_with_time_zone(CardOwners::CreatedAt))
                    .col(timestamp_with_time_zone(CardOwners::UpdatedAt))
                    .col(timestamp_with_time_zone_null(CardOwners::DeletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_owner_card")
                            .from(CardOwners::Table, CardOwners::CardId)
                            .to(Cards::Table, Cards::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_card_owner_user")
                            .from(CardOwners::Table, CardOwners::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(CardOwners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    FirstName,
    LastName,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Cards {
    Table,
    Id,
    CardName,
    CardImage,
    CardQuantity,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum CardOwners {
    Table,
    Id,
    CardId,
    CardNumber,
    IdCard,
    PhoneNumber,
    UserId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
