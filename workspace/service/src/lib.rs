//! Domain core of the card registry: access gate, credentials, tokens,
//! card catalog and card-ownership registry.
//!
//! Operations take a database connection (and a [`token::TokenIssuer`] where
//! tokens are involved) and return [`error::Result`]. Nothing here knows about
//! HTTP.

pub mod access;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod password;
pub mod registry;
pub mod token;

#[cfg(test)]
mod testing;

pub use error::{Result, ServiceError};
pub use token::{Claims, TokenIssuer, TokenKind};
