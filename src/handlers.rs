pub mod auth;
pub mod card_owners;
pub mod cards;
pub mod health;
pub mod users;
