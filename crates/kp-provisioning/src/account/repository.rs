//! Account Store
//!
//! Lookup by (realm, userId) and a conditional upsert. The MongoDB backend
//! keys the upsert on the client ID as well, so a concurrent writer that
//! allocated a different client ID hits the unique (realm, userId) index
//! and the write is reported as `StoreError::Conflict`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mongodb::{Collection, Database, bson::doc};

use crate::Account;
use crate::shared::error::{Result, StoreError};

pub const ACCOUNTS_COLLECTION: &str = "accounts";

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_user_id(&self, realm: &str, user_id: &str) -> Result<Option<Account>>;

    /// Insert the account or fully overwrite the stored one.
    async fn upsert(&self, account: &Account) -> Result<()>;
}

pub struct MongoAccountStore {
    collection: Collection<Account>,
}

impl MongoAccountStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(ACCOUNTS_COLLECTION),
        }
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_by_user_id(&self, realm: &str, user_id: &str) -> Result<Option<Account>> {
        Ok(self.collection.find_one(doc! { "realm": realm, "userId": user_id }).await?)
    }

    async fn upsert(&self, account: &Account) -> Result<()> {
        let filter = doc! {
            "realm": &account.realm,
            "userId": &account.user_id,
            "clientId": &account.client_id,
        };
        self.collection
            .replace_one(filter, account)
            .upsert(true)
            .await
            .map_err(|e| StoreError::from_write_error(e, "Account"))?;
        Ok(())
    }
}

/// Process-local store keyed by (realm, userId).
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: DashMap<(String, String), Account>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, realm: &str, user_id: &str) -> Option<Account> {
        self.accounts
            .get(&(realm.to_string(), user_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_user_id(&self, realm: &str, user_id: &str) -> Result<Option<Account>> {
        Ok(self.get(realm, user_id))
    }

    async fn upsert(&self, account: &Account) -> Result<()> {
        let key = (account.realm.clone(), account.user_id.clone());
        match self.accounts.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().client_id != account.client_id {
                    return Err(StoreError::conflict(
                        "Account",
                        format!(
                            "account for '{}' in realm '{}' is bound to another client ID",
                            account.user_id, account.realm
                        ),
                    ));
                }
                occupied.insert(account.clone());
            }
            Entry::Vacant(vacant) => {
                vacant.insert(account.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_then_find() {
        let store = InMemoryAccountStore::new();
        let account = Account::new("acme", "u1", "c1", 10);

        store.upsert(&account).await.unwrap();

        let found = store.find_by_user_id("acme", "u1").await.unwrap();
        assert_eq!(found, Some(account));
        assert!(store.find_by_user_id("other", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_record() {
        let store = InMemoryAccountStore::new();
        let mut account = Account::new("acme", "u1", "c1", 10);
        store.upsert(&account).await.unwrap();

        account.touch(20);
        store.upsert(&account).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("acme", "u1").unwrap().updated, 20);
    }

    #[tokio::test]
    async fn test_different_client_id_conflicts() {
        let store = InMemoryAccountStore::new();
        store.upsert(&Account::new("acme", "u1", "c1", 10)).await.unwrap();

        let err = store
            .upsert(&Account::new("acme", "u1", "c2", 11))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.get("acme", "u1").unwrap().client_id, "c1");
    }
}
