use super::{card, user};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Select, Set};

/// Registration of a physical card (catalog card + card number) to a user.
///
/// The pair `(card_id, card_number)` is unique among live registrations. The
/// same ID card or phone number may appear on many registrations.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "card_owners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub card_id: i32,
    pub card_number: String,
    /// National ID card number of the holder.
    pub id_card: String,
    pub phone_number: String,
    /// The user that registered (and may modify) this record.
    pub user_id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "card::Entity",
        from = "Column::CardId",
        to = "card::Column::Id"
    )]
    Card,
    #[sea_orm(belongs_to = "user::Entity", from = "Column::UserId", to = "user::Column::Id")]
    User,
}

impl Related<card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Card.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Entity {
    /// Registrations that have not been deleted.
    pub fn find_live() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }

    pub fn find_live_by_id(id: i32) -> Select<Entity> {
        Self::find_live().filter(Column::Id.eq(id))
    }

    pub fn find_live_by_user(user_id: i32) -> Select<Entity> {
        Self::find_live().filter(Column::UserId.eq(user_id))
    }

    pub fn find_live_by_card_and_number(card_id: i32, card_number: &str) -> Select<Entity> {
        Self::find_live()
            .filter(Column::CardId.eq(card_id))
            .filter(Column::CardNumber.eq(card_number))
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
        tracing::trace!(insert, "stamping card owner timestamps");
        Ok(self)
    }
}
