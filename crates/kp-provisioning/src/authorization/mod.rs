//! Authorization Aggregate
//!
//! One authorization per (realm, clientId) carrying the account's bearer token.

pub mod entity;
pub mod repository;
pub mod operations;

pub use entity::{Authorization, AuthorizationRequest, AuthorizationScope, TokenType};
pub use repository::{AuthorizationStore, MongoAuthorizationStore, InMemoryAuthorizationStore};
