//! Authorization Store

use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::{Collection, Database, bson::doc};

use crate::Authorization;
use crate::shared::error::{Result, StoreError};

pub const AUTHORIZATIONS_COLLECTION: &str = "authorizations";

#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    async fn find_by_client_id(&self, realm: &str, client_id: &str) -> Result<Option<Authorization>>;

    /// Insert the authorization or fully overwrite the stored one.
    async fn upsert(&self, authorization: &Authorization) -> Result<()>;
}

pub struct MongoAuthorizationStore {
    collection: Collection<Authorization>,
}

impl MongoAuthorizationStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(AUTHORIZATIONS_COLLECTION),
        }
    }
}

#[async_trait]
impl AuthorizationStore for MongoAuthorizationStore {
    async fn find_by_client_id(&self, realm: &str, client_id: &str) -> Result<Option<Authorization>> {
        Ok(self.collection.find_one(doc! { "realm": realm, "clientId": client_id }).await?)
    }

    // Two racing inserts for the same client ID collide on the unique
    // (realm, clientId) index; the loser gets a Conflict.
    async fn upsert(&self, authorization: &Authorization) -> Result<()> {
        self.collection
            .replace_one(
                doc! { "realm": &authorization.realm, "clientId": &authorization.client_id },
                authorization,
            )
            .upsert(true)
            .await
            .map_err(|e| StoreError::from_write_error(e, "Authorization"))?;
        Ok(())
    }
}

/// Process-local store keyed by (realm, clientId).
#[derive(Default)]
pub struct InMemoryAuthorizationStore {
    authorizations: DashMap<(String, String), Authorization>,
}

impl InMemoryAuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, realm: &str, client_id: &str) -> Option<Authorization> {
        self.authorizations
            .get(&(realm.to_string(), client_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.authorizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorizations.is_empty()
    }
}

#[async_trait]
impl AuthorizationStore for InMemoryAuthorizationStore {
    async fn find_by_client_id(&self, realm: &str, client_id: &str) -> Result<Option<Authorization>> {
        Ok(self.get(realm, client_id))
    }

    async fn upsert(&self, authorization: &Authorization) -> Result<()> {
        self.authorizations.insert(
            (authorization.realm.clone(), authorization.client_id.clone()),
            authorization.clone(),
        );
        Ok(())
    }
}
