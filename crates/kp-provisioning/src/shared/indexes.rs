//! MongoDB Index Initialization
//!
//! The unique indexes are what turn a lost lookup-then-write race into a
//! duplicate-key error instead of a silent overwrite.

use mongodb::{Database, IndexModel, bson::doc, options::IndexOptions};
use tracing::info;

use crate::account::repository::ACCOUNTS_COLLECTION;
use crate::authorization::repository::AUTHORIZATIONS_COLLECTION;

/// Initialize all provisioning indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_account_indexes(db).await?;
    create_authorization_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

fn unique_index(keys: mongodb::bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_account_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>(ACCOUNTS_COLLECTION);

    // One account per user within a realm
    collection.create_index(unique_index(doc! { "realm": 1, "userId": 1 })).await?;

    // Client IDs are never shared
    collection.create_index(unique_index(doc! { "realm": 1, "clientId": 1 })).await?;

    info!("Created indexes on {}", ACCOUNTS_COLLECTION);
    Ok(())
}

async fn create_authorization_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let collection = db.collection::<mongodb::bson::Document>(AUTHORIZATIONS_COLLECTION);

    // One authorization per client within a realm
    collection.create_index(unique_index(doc! { "realm": 1, "clientId": 1 })).await?;

    info!("Created indexes on {}", AUTHORIZATIONS_COLLECTION);
    Ok(())
}
