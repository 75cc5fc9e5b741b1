//! Root of the SeaORM entity modules.
//!
//! Every table carries `created_at`/`updated_at` stamped by the active model
//! behavior and a `deleted_at` tombstone. Rows are never physically removed;
//! use the `find_live*` helpers on each entity to exclude tombstoned rows.

pub mod card;
pub mod card_owner;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::card::Entity as Card;
    pub use super::card_owner::Entity as CardOwner;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn insert_user(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            role: Set(user::Role::User),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn insert_card(db: &DatabaseConnection, name: &str) -> Result<card::Model, DbErr> {
        card::ActiveModel {
            card_name: Set(name.to_string()),
            card_image: Set(format!("{}.png", name.to_lowercase())),
            card_quantity: Set(5),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn insert_owner(
        db: &DatabaseConnection,
        user_id: i32,
        card_id: i32,
        card_number: &str,
    ) -> Result<card_owner::Model, DbErr> {
        card_owner::ActiveModel {
            card_id: Set(card_id),
            card_number: Set(card_number.to_string()),
            id_card: Set("1234567890123".to_string()),
            phone_number: Set("0812345678".to_string()),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let user1 = insert_user(&db, "user1").await?;
        let gold = insert_card(&db, "Gold").await?;
        assert_eq!(user1.role, user::Role::User);
        assert!(user1.deleted_at.is_none());
        assert_eq!(gold.created_at, gold.updated_at);

        let owner = insert_owner(&db, user1.id, gold.id, "AAA").await?;

        // Navigate the relations in both directions
        let owned = user1.find_related(CardOwner).all(&db).await?;
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, owner.id);

        let card_of_owner = owner.find_related(Card).one(&db).await?;
        assert_eq!(card_of_owner.map(|c| c.card_name), Some("Gold".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_card_number_unique_per_card() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let user1 = insert_user(&db, "user1").await?;
        let gold = insert_card(&db, "Gold").await?;
        let silver = insert_card(&db, "Silver").await?;

        insert_owner(&db, user1.id, gold.id, "AAA").await?;

        // The same number on another card is fine
        insert_owner(&db, user1.id, silver.id, "AAA").await?;

        // The same pair is rejected by the storage layer
        let duplicate = insert_owner(&db, user1.id, gold.id, "AAA").await;
        let err = duplicate.expect_err("duplicate pair must violate the unique index");
        assert!(matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_tombstoned_rows_are_hidden_and_release_uniqueness() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let user1 = insert_user(&db, "user1").await?;
        let gold = insert_card(&db, "Gold").await?;
        let owner = insert_owner(&db, user1.id, gold.id, "AAA").await?;

        let mut tombstone: card_owner::ActiveModel = owner.clone().into();
        tombstone.deleted_at = Set(Some(chrono::Utc::now()));
        tombstone.update(&db).await?;

        assert!(CardOwner::find_live_by_id(owner.id).one(&db).await?.is_none());
        assert!(CardOwner::find_by_id(owner.id).one(&db).await?.is_some());

        // The pair can be registered again once the old row is tombstoned
        let again = insert_owner(&db, user1.id, gold.id, "AAA").await?;
        assert_ne!(again.id, owner.id);

        let live = CardOwner::find_live_by_card_and_number(gold.id, "AAA")
            .all(&db)
            .await?;
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, again.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_updated_at_moves_on_update() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let gold = insert_card(&db, "Gold").await?;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let mut active: card::ActiveModel = gold.clone().into();
        active.card_quantity = Set(0);
        let updated = active.update(&db).await?;

        assert_eq!(updated.card_quantity, 0);
        assert_eq!(updated.created_at, gold.created_at);
        assert!(updated.updated_at > gold.updated_at);

        Ok(())
    }
}
