use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Select, Set};

/// A card definition in the master catalog.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Unique among live cards.
    pub card_name: String,
    pub card_image: String,
    /// Number of physical cards available, never negative.
    #[sea_orm(default_value = "0")]
    pub card_quantity: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Tombstone set by a soft delete.
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::card_owner::Entity")]
    CardOwner,
}

impl Related<super::card_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardOwner.def()
    }
}

impl Entity {
    /// Cards that have not been soft-deleted.
    pub fn find_live() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }

    pub fn find_live_by_id(id: i32) -> Select<Entity> {
        Self::find_live().filter(Column::Id.eq(id))
    }

    pub fn find_live_by_name(card_name: &str) -> Select<Entity> {
        Self::find_live().filter(Column::CardName.eq(card_name))
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
