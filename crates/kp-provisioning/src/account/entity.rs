//! Account Entity

use serde::{Deserialize, Serialize};

use crate::shared::expiration::{expires_at, NEVER_EXPIRES};

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

/// Account entity. Timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Tenant namespace, immutable once set
    pub realm: String,

    /// External user identifier, unique within the realm
    pub user_id: String,

    /// System-generated identifier, assigned once at creation
    pub client_id: String,

    #[serde(default)]
    pub status: AccountStatus,

    pub confirmed: i64,
    pub created: i64,
    pub updated: i64,

    /// Absolute expiry, or 0 for never
    #[serde(default)]
    pub expires: i64,
}

impl Account {
    /// New active account, confirmed at creation.
    pub fn new(
        realm: impl Into<String>,
        user_id: impl Into<String>,
        client_id: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            realm: realm.into(),
            user_id: user_id.into(),
            client_id: client_id.into(),
            status: AccountStatus::Active,
            confirmed: now,
            created: now,
            updated: now,
            expires: NEVER_EXPIRES,
        }
    }

    pub fn apply_expiration(&mut self, now: i64, expiration_days: i64) {
        self.expires = expires_at(now, expiration_days);
    }

    pub fn touch(&mut self, now: i64) {
        self.updated = now;
    }
}
