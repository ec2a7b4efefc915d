//! Issue Token Use Case
//!
//! Find-or-create the authorization for an account's client ID and rotate
//! its token. Every call invalidates the previous token.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{Account, Authorization, AuthorizationRequest};
use crate::AuthorizationStore;
use crate::shared::error::Result;
use crate::shared::token::TokenGenerator;
use crate::usecase::ExecutionContext;

/// Command for issuing a token to a resolved account.
#[derive(Debug, Clone)]
pub struct IssueTokenCommand {
    pub user_id: String,
    /// Days until expiry; zero or negative means never
    pub expiration_days: i64,
}

/// Result of issuing a token.
#[derive(Debug, Clone)]
pub struct IssueTokenResult {
    pub authorization: Authorization,
    /// Whether the authorization was created by this call
    pub created: bool,
}

/// Use case for issuing a fresh token.
pub struct IssueTokenUseCase {
    authorization_store: Arc<dyn AuthorizationStore>,
    token_generator: Arc<dyn TokenGenerator>,
}

impl IssueTokenUseCase {
    pub fn new(
        authorization_store: Arc<dyn AuthorizationStore>,
        token_generator: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            authorization_store,
            token_generator,
        }
    }

    pub async fn execute(
        &self,
        account: &Account,
        command: &IssueTokenCommand,
        ctx: &ExecutionContext,
    ) -> Result<IssueTokenResult> {
        let now = ctx.now();

        let existing = self
            .authorization_store
            .find_by_client_id(&account.realm, &account.client_id)
            .await?;

        let (mut authorization, created) = match existing {
            Some(authorization) => (authorization, false),
            None => {
                debug!(client_id = %account.client_id, "Creating authorization");
                let request = AuthorizationRequest::admin(account, &command.user_id);
                (request.materialize(now, command.expiration_days), true)
            }
        };

        authorization.rotate_token(self.token_generator.new_token());
        // Recomputed from now, not copied from the account
        authorization.apply_expiration(now, command.expiration_days);
        authorization.touch(now);

        self.authorization_store.upsert(&authorization).await?;

        info!(
            client_id = %authorization.client_id,
            created,
            expires = authorization.expires,
            "Token issued"
        );

        Ok(IssueTokenResult { authorization, created })
    }
}
