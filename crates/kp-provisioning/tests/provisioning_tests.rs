//! Provisioning Workflow Tests
//!
//! End-to-end behavior of `ProvisioningService` over in-memory stores, plus
//! failure-injecting stores for the error and conflict paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use kp_provisioning::{
    Account, AccountStatus, AccountStore, Authorization, AuthorizationScope, AuthorizationStore,
    ExecutionContext, FixedClock, InMemoryAccountStore, InMemoryAuthorizationStore,
    ProvisioningService, RandomTokenGenerator, StoreError, TokenType, TsidIdGenerator,
};

const T0: i64 = 1_700_000_000;
const T1: i64 = 1_700_100_000;

struct Harness {
    accounts: Arc<InMemoryAccountStore>,
    authorizations: Arc<InMemoryAuthorizationStore>,
    clock: Arc<FixedClock>,
    service: ProvisioningService,
}

fn harness() -> Harness {
    let accounts = Arc::new(InMemoryAccountStore::new());
    let authorizations = Arc::new(InMemoryAuthorizationStore::new());
    let clock = Arc::new(FixedClock::new(T0));
    let service = ProvisioningService::with_collaborators(
        accounts.clone(),
        authorizations.clone(),
        Arc::new(TsidIdGenerator),
        Arc::new(RandomTokenGenerator::default()),
        clock.clone(),
    );
    Harness { accounts, authorizations, clock, service }
}

// ============================================================================
// Failure-injecting stores
// ============================================================================

/// Authorization store whose writes fail while `fail_writes` is set.
#[derive(Default)]
struct FlakyAuthorizationStore {
    inner: InMemoryAuthorizationStore,
    fail_writes: AtomicBool,
}

#[async_trait]
impl AuthorizationStore for FlakyAuthorizationStore {
    async fn find_by_client_id(&self, realm: &str, client_id: &str) -> kp_provisioning::Result<Option<Authorization>> {
        self.inner.find_by_client_id(realm, client_id).await
    }

    async fn upsert(&self, authorization: &Authorization) -> kp_provisioning::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("authorization store write timed out"));
        }
        self.inner.upsert(authorization).await
    }
}

/// Account store whose lookups always fail; counts writes.
#[derive(Default)]
struct UnreachableAccountStore {
    writes: AtomicU32,
}

#[async_trait]
impl AccountStore for UnreachableAccountStore {
    async fn find_by_user_id(&self, _realm: &str, _user_id: &str) -> kp_provisioning::Result<Option<Account>> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn upsert(&self, _account: &Account) -> kp_provisioning::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Account store that reports a conflict for the first `conflicts` writes.
struct ContendedAccountStore {
    inner: InMemoryAccountStore,
    conflicts: u32,
    attempts: AtomicU32,
}

impl ContendedAccountStore {
    fn new(conflicts: u32) -> Self {
        Self {
            inner: InMemoryAccountStore::new(),
            conflicts,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl AccountStore for ContendedAccountStore {
    async fn find_by_user_id(&self, realm: &str, user_id: &str) -> kp_provisioning::Result<Option<Account>> {
        self.inner.find_by_user_id(realm, user_id).await
    }

    async fn upsert(&self, account: &Account) -> kp_provisioning::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.conflicts {
            return Err(StoreError::conflict("Account", "duplicate key on (realm, userId)"));
        }
        self.inner.upsert(account).await
    }
}

/// Account store that counts writes.
#[derive(Default)]
struct CountingAccountStore {
    inner: InMemoryAccountStore,
    writes: AtomicU32,
}

#[async_trait]
impl AccountStore for CountingAccountStore {
    async fn find_by_user_id(&self, realm: &str, user_id: &str) -> kp_provisioning::Result<Option<Account>> {
        self.inner.find_by_user_id(realm, user_id).await
    }

    async fn upsert(&self, account: &Account) -> kp_provisioning::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(account).await
    }
}

/// Authorization store that reports a conflict for its first write.
#[derive(Default)]
struct ContendedAuthorizationStore {
    inner: InMemoryAuthorizationStore,
    attempts: AtomicU32,
}

#[async_trait]
impl AuthorizationStore for ContendedAuthorizationStore {
    async fn find_by_client_id(&self, realm: &str, client_id: &str) -> kp_provisioning::Result<Option<Authorization>> {
        self.inner.find_by_client_id(realm, client_id).await
    }

    async fn upsert(&self, authorization: &Authorization) -> kp_provisioning::Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::conflict("Authorization", "duplicate key on (realm, clientId)"));
        }
        self.inner.upsert(authorization).await
    }
}

/// Account store that yields after every lookup so concurrent calls interleave.
#[derive(Default)]
struct InterleavingAccountStore {
    inner: InMemoryAccountStore,
}

#[async_trait]
impl AccountStore for InterleavingAccountStore {
    async fn find_by_user_id(&self, realm: &str, user_id: &str) -> kp_provisioning::Result<Option<Account>> {
        let found = self.inner.find_by_user_id(realm, user_id).await;
        tokio::task::yield_now().await;
        found
    }

    async fn upsert(&self, account: &Account) -> kp_provisioning::Result<()> {
        self.inner.upsert(account).await
    }
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_scenario_first_call_then_negative_days() {
    let h = harness();

    let first = h.service.provision_and_issue("acme", "u1", 30).await.unwrap();

    let account = h.accounts.get("acme", "u1").unwrap();
    let authorization = h.authorizations.get("acme", &account.client_id).unwrap();
    assert_eq!(account.expires, 1_702_592_000);
    assert_eq!(authorization.expires, 1_702_592_000);
    assert!(!first.token().is_empty());
    assert_eq!(authorization.token, first.token);
    assert!(first.created_account);
    assert!(first.created_authorization);

    h.clock.set(T1);
    let second = h.service.provision_and_issue("acme", "u1", -5).await.unwrap();

    let account_after = h.accounts.get("acme", "u1").unwrap();
    let authorization_after = h.authorizations.get("acme", &account_after.client_id).unwrap();
    assert_eq!(account_after.client_id, account.client_id);
    assert_eq!(second.client_id, first.client_id);
    assert_eq!(account_after.expires, 0);
    assert_eq!(authorization_after.expires, 0);
    assert_ne!(second.token, first.token);
    assert!(!second.created_account);
    assert!(!second.created_authorization);
}

#[tokio::test]
async fn test_client_id_stable_and_token_rotates() {
    let h = harness();
    let mut previous = h.service.provision_and_issue("acme", "u1", 7).await.unwrap();

    for step in 1..=5 {
        h.clock.set(T0 + step * 60);
        let next = h.service.provision_and_issue("acme", "u1", 7).await.unwrap();
        assert_eq!(next.client_id, previous.client_id);
        assert_ne!(next.token, previous.token);
        previous = next;
    }

    assert_eq!(h.accounts.len(), 1);
    assert_eq!(h.authorizations.len(), 1);
}

#[tokio::test]
async fn test_expiration_matches_for_both_entities() {
    let h = harness();

    for days in [1_i64, 30, 365] {
        let credential = h.service.provision_and_issue("acme", "u1", days).await.unwrap();
        let account = h.accounts.get("acme", "u1").unwrap();
        let authorization = h.authorizations.get("acme", &account.client_id).unwrap();

        assert_eq!(account.expires, T0 + days * 86_400);
        assert_eq!(authorization.expires, T0 + days * 86_400);
        assert_eq!(credential.expires, authorization.expires);
    }
}

#[tokio::test]
async fn test_negative_days_same_as_zero() {
    let negative = harness();
    negative.service.provision_and_issue("acme", "u1", -30).await.unwrap();
    let zero = harness();
    zero.service.provision_and_issue("acme", "u1", 0).await.unwrap();

    for h in [&negative, &zero] {
        let account = h.accounts.get("acme", "u1").unwrap();
        let authorization = h.authorizations.get("acme", &account.client_id).unwrap();
        assert_eq!(account.expires, 0);
        assert_eq!(authorization.expires, 0);
    }
}

#[tokio::test]
async fn test_new_account_defaults() {
    let h = harness();
    h.service.provision_and_issue("acme", "u1", 0).await.unwrap();

    let account = h.accounts.get("acme", "u1").unwrap();
    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.confirmed, T0);
    assert_eq!(account.confirmed, account.created);
    assert_eq!(account.created, account.updated);

    let authorization = h.authorizations.get("acme", &account.client_id).unwrap();
    assert_eq!(authorization.scope, AuthorizationScope::ApiAdmin);
    assert_eq!(authorization.token_type, TokenType::Api);
    assert_eq!(authorization.user_id, "u1");
    assert_eq!(authorization.created, T0);
}

#[tokio::test]
async fn test_shared_now_for_all_timestamps() {
    let h = harness();
    h.service.provision_and_issue("acme", "u1", 0).await.unwrap();
    h.clock.set(T1);
    h.service.provision_and_issue("acme", "u1", 0).await.unwrap();

    let account = h.accounts.get("acme", "u1").unwrap();
    let authorization = h.authorizations.get("acme", &account.client_id).unwrap();
    assert_eq!(account.updated, T1);
    assert_eq!(authorization.updated, T1);
    assert_eq!(account.created, T0);
    assert_eq!(authorization.created, T0);
}

#[tokio::test]
async fn test_realms_are_isolated() {
    let h = harness();
    let acme = h.service.provision_and_issue("acme", "u1", 0).await.unwrap();
    let globex = h.service.provision_and_issue("globex", "u1", 0).await.unwrap();

    assert_ne!(acme.client_id, globex.client_id);
    assert_eq!(h.accounts.len(), 2);
    assert_eq!(h.authorizations.len(), 2);
}

#[tokio::test]
async fn test_caller_context_supplies_now() {
    let h = harness();
    let ctx = ExecutionContext::with_correlation("ops", "req-42", T1);

    let credential = h
        .service
        .provision_and_issue_in("acme", "u1", 1, ctx)
        .await
        .unwrap();

    assert_eq!(credential.expires, T1 + 86_400);
    assert_eq!(h.accounts.get("acme", "u1").unwrap().created, T1);
}

// ============================================================================
// Failure ordering
// ============================================================================

#[tokio::test]
async fn test_authorization_write_failure_keeps_account_and_recovers() {
    let accounts = Arc::new(InMemoryAccountStore::new());
    let authorizations = Arc::new(FlakyAuthorizationStore::default());
    let clock = Arc::new(FixedClock::new(T0));
    let service = ProvisioningService::with_collaborators(
        accounts.clone(),
        authorizations.clone(),
        Arc::new(TsidIdGenerator),
        Arc::new(RandomTokenGenerator::default()),
        clock.clone(),
    );

    authorizations.fail_writes.store(true, Ordering::SeqCst);
    let err = service.provision_and_issue("acme", "u1", 30).await.unwrap_err();

    match err {
        StoreError::Unavailable { message } => assert_eq!(message, "authorization store write timed out"),
        other => panic!("expected Unavailable, got {:?}", other),
    }
    let account = accounts.get("acme", "u1").expect("account write is not rolled back");
    assert_eq!(account.updated, T0);
    assert_eq!(account.expires, T0 + 30 * 86_400);
    assert!(authorizations.inner.is_empty());

    authorizations.fail_writes.store(false, Ordering::SeqCst);
    clock.set(T1);
    let credential = service.provision_and_issue("acme", "u1", 30).await.unwrap();

    let account_after = accounts.get("acme", "u1").unwrap();
    let authorization = authorizations.inner.get("acme", &account_after.client_id).unwrap();
    assert_eq!(account_after.client_id, account.client_id);
    assert_eq!(credential.client_id, account.client_id);
    assert_eq!(account_after.expires, authorization.expires);
    assert_eq!(authorization.token, credential.token);
}

#[tokio::test]
async fn test_lookup_failure_aborts_without_writes() {
    let accounts = Arc::new(UnreachableAccountStore::default());
    let authorizations = Arc::new(InMemoryAuthorizationStore::new());
    let service = ProvisioningService::new(accounts.clone(), authorizations.clone());

    let err = service.provision_and_issue("acme", "u1", 30).await.unwrap_err();

    assert!(matches!(err, StoreError::Unavailable { ref message } if message == "connection refused"));
    assert_eq!(accounts.writes.load(Ordering::SeqCst), 0);
    assert!(authorizations.is_empty());
}

// ============================================================================
// Conflicts
// ============================================================================

#[tokio::test]
async fn test_conflict_reruns_sequence() {
    let accounts = Arc::new(ContendedAccountStore::new(2));
    let authorizations = Arc::new(InMemoryAuthorizationStore::new());
    let service = ProvisioningService::new(accounts.clone(), authorizations.clone())
        .with_max_conflict_retries(3);

    let credential = service.provision_and_issue("acme", "u1", 0).await.unwrap();

    assert_eq!(accounts.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(accounts.inner.get("acme", "u1").unwrap().client_id, credential.client_id);
    assert_eq!(authorizations.len(), 1);
}

#[tokio::test]
async fn test_authorization_conflict_rewrites_account_once_per_attempt() {
    let accounts = Arc::new(CountingAccountStore::default());
    let authorizations = Arc::new(ContendedAuthorizationStore::default());
    let service = ProvisioningService::new(accounts.clone(), authorizations.clone());

    let credential = service.provision_and_issue("acme", "u1", 0).await.unwrap();

    assert_eq!(accounts.writes.load(Ordering::SeqCst), 2);
    assert_eq!(authorizations.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(accounts.inner.len(), 1);
    assert_eq!(accounts.inner.get("acme", "u1").unwrap().client_id, credential.client_id);
    assert_eq!(authorizations.inner.get("acme", &credential.client_id).unwrap().token, credential.token);
}

#[tokio::test]
async fn test_conflict_retries_exhausted_returns_conflict() {
    let accounts = Arc::new(ContendedAccountStore::new(u32::MAX));
    let authorizations = Arc::new(InMemoryAuthorizationStore::new());
    let service = ProvisioningService::new(accounts.clone(), authorizations.clone())
        .with_max_conflict_retries(2);

    let err = service.provision_and_issue("acme", "u1", 0).await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(accounts.attempts.load(Ordering::SeqCst), 3);
    assert!(authorizations.is_empty());
}

#[tokio::test]
async fn test_no_retries_when_disabled() {
    let accounts = Arc::new(ContendedAccountStore::new(1));
    let service = ProvisioningService::new(accounts.clone(), Arc::new(InMemoryAuthorizationStore::new()))
        .with_max_conflict_retries(0);

    assert!(service.provision_and_issue("acme", "u1", 0).await.unwrap_err().is_conflict());
    assert_eq!(accounts.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_first_calls_converge_on_one_client_id() {
    let accounts = Arc::new(InterleavingAccountStore::default());
    let authorizations = Arc::new(InMemoryAuthorizationStore::new());
    let service = ProvisioningService::new(accounts.clone(), authorizations.clone());

    let (a, b) = tokio::join!(
        service.provision_and_issue("acme", "u1", 0),
        service.provision_and_issue("acme", "u1", 0),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.client_id, b.client_id);
    assert_ne!(a.token, b.token);
    assert_eq!(accounts.inner.len(), 1);
    assert_eq!(authorizations.len(), 1);
    let stored = authorizations.get("acme", &a.client_id).unwrap();
    assert!(stored.token == a.token || stored.token == b.token);
}
