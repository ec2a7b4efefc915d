//! Keyprov Provisioning
//!
//! Ensures an account exists for a (realm, userId) pair and issues a fresh
//! API token bound to it.
//!
//! - `account` - account aggregate, store and provisioning use case
//! - `authorization` - authorization aggregate, store and token issuing use case
//! - `provisioning` - the end-to-end workflow with conflict re-runs
//! - `usage` - best-effort usage analytics
//! - `shared` - errors, generators, clock, expiration policy, indexes

pub mod shared;
pub mod usecase;
pub mod account;
pub mod authorization;
pub mod provisioning;
pub mod usage;

pub use account::{Account, AccountStatus, AccountStore, MongoAccountStore, InMemoryAccountStore};
pub use authorization::{
    Authorization, AuthorizationRequest, AuthorizationScope, TokenType,
    AuthorizationStore, MongoAuthorizationStore, InMemoryAuthorizationStore,
};
pub use provisioning::{ProvisioningService, ProvisionedCredential, DEFAULT_MAX_CONFLICT_RETRIES};
pub use shared::{
    StoreError, Result,
    TsidGenerator, IdGenerator, TsidIdGenerator,
    TokenGenerator, RandomTokenGenerator,
    Clock, SystemClock, FixedClock,
};
pub use shared::indexes::initialize_indexes;
pub use usecase::ExecutionContext;
pub use usage::{
    UsageEvent, UsageNotifier, UsageNotifierConfig, UsageError,
    NoOpUsageNotifier, HttpUsageNotifier, notify_detached,
};
