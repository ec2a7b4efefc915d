//! Provision Account Use Case
//!
//! Find-or-create the account for (realm, userId), refresh its expiry and
//! persist it with exactly one write.

use std::sync::Arc;

use tracing::{debug, info};

use crate::Account;
use crate::AccountStore;
use crate::shared::error::Result;
use crate::shared::tsid::IdGenerator;
use crate::usecase::ExecutionContext;

/// Command for provisioning an account.
#[derive(Debug, Clone)]
pub struct ProvisionAccountCommand {
    pub realm: String,
    pub user_id: String,
    /// Days until expiry; zero or negative means never
    pub expiration_days: i64,
}

/// Result of provisioning an account.
#[derive(Debug, Clone)]
pub struct ProvisionAccountResult {
    pub account: Account,
    /// Whether the account was created by this call
    pub created: bool,
}

/// Use case for provisioning an account.
pub struct ProvisionAccountUseCase {
    account_store: Arc<dyn AccountStore>,
    id_generator: Arc<dyn IdGenerator>,
}

impl ProvisionAccountUseCase {
    pub fn new(
        account_store: Arc<dyn AccountStore>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            account_store,
            id_generator,
        }
    }

    pub async fn execute(
        &self,
        command: &ProvisionAccountCommand,
        ctx: &ExecutionContext,
    ) -> Result<ProvisionAccountResult> {
        let now = ctx.now();

        let existing = self
            .account_store
            .find_by_user_id(&command.realm, &command.user_id)
            .await?;

        let (mut account, created) = match existing {
            Some(account) => {
                debug!(client_id = %account.client_id, "Reusing existing account");
                (account, false)
            }
            None => {
                let client_id = self.id_generator.new_id();
                debug!(client_id = %client_id, "Allocating new account");
                (Account::new(&command.realm, &command.user_id, client_id, now), true)
            }
        };

        account.apply_expiration(now, command.expiration_days);
        account.touch(now);

        self.account_store.upsert(&account).await?;

        info!(
            client_id = %account.client_id,
            created,
            expires = account.expires,
            "Account provisioned"
        );

        Ok(ProvisionAccountResult { account, created })
    }
}
