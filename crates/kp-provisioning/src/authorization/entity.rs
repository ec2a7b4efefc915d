//! Authorization Entity

use serde::{Deserialize, Serialize};

use crate::Account;
use crate::shared::expiration::expires_at;

/// Privileges granted by an authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationScope {
    /// Full administrative access to the API
    ApiAdmin,
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Api,
}

/// Request for an authorization that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub realm: String,
    pub user_id: String,
    pub client_id: String,
    pub scope: AuthorizationScope,
}

impl AuthorizationRequest {
    /// Administrative request bound to the account's client ID.
    pub fn admin(account: &Account, user_id: impl Into<String>) -> Self {
        Self {
            realm: account.realm.clone(),
            user_id: user_id.into(),
            client_id: account.client_id.clone(),
            scope: AuthorizationScope::ApiAdmin,
        }
    }

    /// Build the authorization. The token is empty until rotated.
    pub fn materialize(self, now: i64, expiration_days: i64) -> Authorization {
        Authorization {
            realm: self.realm,
            user_id: self.user_id,
            client_id: self.client_id,
            scope: self.scope,
            token: String::new(),
            token_type: TokenType::Api,
            created: now,
            updated: now,
            expires: expires_at(now, expiration_days),
        }
    }
}

/// Authorization entity. Timestamps are epoch seconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub realm: String,
    pub user_id: String,

    /// Join key into the owning account
    pub client_id: String,

    /// Fixed at creation
    pub scope: AuthorizationScope,

    /// Opaque bearer credential
    pub token: String,

    #[serde(default)]
    pub token_type: TokenType,

    pub created: i64,
    pub updated: i64,

    /// Absolute expiry, or 0 for never
    #[serde(default)]
    pub expires: i64,
}

// Hand-written so the bearer token never reaches logs.
impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorization")
            .field("realm", &self.realm)
            .field("user_id", &self.user_id)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("created", &self.created)
            .field("updated", &self.updated)
            .field("expires", &self.expires)
            .finish()
    }
}

impl Authorization {
    /// Replace the token with a freshly generated one.
    pub fn rotate_token(&mut self, token: String) {
        self.token = token;
        self.token_type = TokenType::Api;
    }

    pub fn apply_expiration(&mut self, now: i64, expiration_days: i64) {
        self.expires = expires_at(now, expiration_days);
    }

    pub fn touch(&mut self, now: i64) {
        self.updated = now;
    }
}
