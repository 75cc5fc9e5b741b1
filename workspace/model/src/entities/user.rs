use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Select, Set};
use serde::{Deserialize, Serialize};

/// Role of a user account. Admins may list and search across every registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account able to log in and register card owners.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string, never the plaintext password.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user can hold many card registrations.
    #[sea_orm(has_many = "super::card_owner::Entity")]
    CardOwner,
}

impl Related<super::card_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardOwner.def()
    }
}

impl Entity {
    /// Users that have not been tombstoned.
    pub fn find_live() -> Select<Entity> {
        Self::find().filter(Column::DeletedAt.is_null())
    }

    pub fn find_live_by_id(id: i32) -> Select<Entity> {
        Self::find_live().filter(Column::Id.eq(id))
    }

    pub fn find_live_by_username(username: &str) -> Select<Entity> {
        Self::find_live().filter(Column::Username.eq(username))
    }
}

impl Model {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
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
