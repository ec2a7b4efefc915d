//! Provisioning Workflow
//!
//! `ProvisionAndIssue`: resolve/create the account, persist it, then
//! resolve/create its authorization, rotate the token and persist that.
//!
//! The two writes are not atomic. If the authorization write fails the
//! account write stays committed; running the same call again re-derives
//! both records from store state and converges. A `StoreError::Conflict`
//! from either conditional write re-runs the whole sequence, up to
//! `max_conflict_retries` extra attempts. Every other error is returned
//! unchanged on first occurrence.
//!
//! Each attempt writes the account exactly once. A re-run after an
//! authorization conflict therefore writes the account again, so one call
//! performs up to `max_conflict_retries + 1` account writes.

use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument};

use crate::account::operations::{ProvisionAccountCommand, ProvisionAccountUseCase};
use crate::authorization::operations::{IssueTokenCommand, IssueTokenUseCase};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::error::Result;
use crate::shared::token::{RandomTokenGenerator, TokenGenerator};
use crate::shared::tsid::{IdGenerator, TsidIdGenerator};
use crate::usecase::execution_context::{ExecutionContext, SYSTEM_PRINCIPAL};
use crate::{AccountStore, AuthorizationStore};

pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Outcome of a successful provisioning call.
#[derive(Clone)]
pub struct ProvisionedCredential {
    pub realm: String,
    pub user_id: String,
    pub client_id: String,
    pub token: String,
    pub expires: i64,
    pub created_account: bool,
    pub created_authorization: bool,
}

impl ProvisionedCredential {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for ProvisionedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedCredential")
            .field("realm", &self.realm)
            .field("user_id", &self.user_id)
            .field("client_id", &self.client_id)
            .field("token", &"<redacted>")
            .field("expires", &self.expires)
            .field("created_account", &self.created_account)
            .field("created_authorization", &self.created_authorization)
            .finish()
    }
}

pub struct ProvisioningService {
    provision_account: ProvisionAccountUseCase,
    issue_token: IssueTokenUseCase,
    clock: Arc<dyn Clock>,
    max_conflict_retries: u32,
}

impl ProvisioningService {
    /// Service with TSID client IDs, random `kp_` tokens and the system clock.
    pub fn new(
        account_store: Arc<dyn AccountStore>,
        authorization_store: Arc<dyn AuthorizationStore>,
    ) -> Self {
        Self::with_collaborators(
            account_store,
            authorization_store,
            Arc::new(TsidIdGenerator),
            Arc::new(RandomTokenGenerator::default()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_collaborators(
        account_store: Arc<dyn AccountStore>,
        authorization_store: Arc<dyn AuthorizationStore>,
        id_generator: Arc<dyn IdGenerator>,
        token_generator: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provision_account: ProvisionAccountUseCase::new(account_store, id_generator),
            issue_token: IssueTokenUseCase::new(authorization_store, token_generator),
            clock,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Provision the account for (realm, user_id) and issue a fresh token.
    pub async fn provision_and_issue(
        &self,
        realm: &str,
        user_id: &str,
        expiration_days: i64,
    ) -> Result<ProvisionedCredential> {
        let ctx = ExecutionContext::create(SYSTEM_PRINCIPAL, self.clock.now());
        self.provision_and_issue_in(realm, user_id, expiration_days, ctx).await
    }

    /// Same as [`provision_and_issue`](Self::provision_and_issue) with a
    /// caller-supplied context, e.g. to continue an upstream correlation ID.
    pub async fn provision_and_issue_in(
        &self,
        realm: &str,
        user_id: &str,
        expiration_days: i64,
        ctx: ExecutionContext,
    ) -> Result<ProvisionedCredential> {
        let span = info_span!(
            "provision",
            realm = %realm,
            user_id = %user_id,
            execution_id = %ctx.execution_id,
            correlation_id = %ctx.correlation_id,
        );

        async move {
            let max_attempts = self.max_conflict_retries.saturating_add(1);
            let mut attempt: u32 = 1;

            loop {
                match self.run_once(realm, user_id, expiration_days, &ctx).await {
                    Ok(credential) => return Ok(credential),
                    Err(err) if err.is_conflict() && attempt < max_attempts => {
                        warn!(attempt, max_attempts, error = %err, "Write conflict, re-running provisioning");
                        attempt += 1;
                    }
                    Err(err) => {
                        error!(attempt, error = %err, "Provisioning failed");
                        return Err(err);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_once(
        &self,
        realm: &str,
        user_id: &str,
        expiration_days: i64,
        ctx: &ExecutionContext,
    ) -> Result<ProvisionedCredential> {
        let account_command = ProvisionAccountCommand {
            realm: realm.to_string(),
            user_id: user_id.to_string(),
            expiration_days,
        };
        let provisioned = self.provision_account.execute(&account_command, ctx).await?;

        let token_command = IssueTokenCommand {
            user_id: user_id.to_string(),
            expiration_days,
        };
        let issued = self
            .issue_token
            .execute(&provisioned.account, &token_command, ctx)
            .await?;

        info!(
            client_id = %issued.authorization.client_id,
            created_account = provisioned.created,
            created_authorization = issued.created,
            "Provisioning complete"
        );

        Ok(ProvisionedCredential {
            realm: provisioned.account.realm,
            user_id: provisioned.account.user_id,
            client_id: issued.authorization.client_id,
            token: issued.authorization.token,
            expires: issued.authorization.expires,
            created_account: provisioned.created,
            created_authorization: issued.created,
        })
    }
}
