//! Account Aggregate
//!
//! One account per (realm, userId), identified downstream by its client ID.

pub mod entity;
pub mod repository;
pub mod operations;

pub use entity::{Account, AccountStatus};
pub use repository::{AccountStore, MongoAccountStore, InMemoryAccountStore};
