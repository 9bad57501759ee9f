/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and scriptable data layer
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for zero2hero-rewards tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;
use wiremock::MockServer;
use zero2hero_rewards::{
    AuthGateway, DataLayer, GatewayConfig, Identity, MemorySessionCache, MockIdentityProvider,
    Notification, NotificationId, Result, Reward, RewardsError, RetryPolicy, SessionStore,
    SqliteDataLayer, Transaction, TransactionKind, User, UserId,
};

pub const TEST_CLIENT_ID: &str = "BKR-test-client-id";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Unique email so parallel tests never collide
pub fn unique_email() -> String {
    format!("{}@x.com", uuid::Uuid::new_v4().simple())
}

/// Blocks a call while held, signalling when a caller arrives
#[derive(Debug, Default)]
struct Gate {
    held: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    async fn pass(&self) {
        if self.held.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

/// SQLite-backed data layer that records calls and can inject failures
#[derive(Debug)]
pub struct ScriptedDataLayer {
    inner: SqliteDataLayer,
    upserts: Mutex<Vec<(String, String)>>,
    mark_read_calls: AtomicU32,
    fail_upsert: AtomicBool,
    fail_mark_read: AtomicBool,
    balance_gate: Gate,
    upsert_gate: Gate,
    mark_read_gate: Gate,
}

impl ScriptedDataLayer {
    pub fn new() -> Self {
        Self {
            inner: SqliteDataLayer::in_memory().expect("in-memory database"),
            upserts: Mutex::new(Vec::new()),
            mark_read_calls: AtomicU32::new(0),
            fail_upsert: AtomicBool::new(false),
            fail_mark_read: AtomicBool::new(false),
            balance_gate: Gate::default(),
            upsert_gate: Gate::default(),
            mark_read_gate: Gate::default(),
        }
    }

    pub fn upserts(&self) -> Vec<(String, String)> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn mark_read_calls(&self) -> u32 {
        self.mark_read_calls.load(Ordering::SeqCst)
    }

    pub fn fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mark_read(&self, fail: bool) {
        self.fail_mark_read.store(fail, Ordering::SeqCst);
    }

    /// Make the next balance reads block until [`Self::release_balance`]
    pub fn hold_balance(&self) {
        self.balance_gate.hold();
    }

    pub async fn wait_balance_entered(&self) {
        self.balance_gate.wait_entered().await;
    }

    pub fn release_balance(&self) {
        self.balance_gate.release();
    }

    /// Make the next user upserts block until [`Self::release_upsert`]
    pub fn hold_upsert(&self) {
        self.upsert_gate.hold();
    }

    pub async fn wait_upsert_entered(&self) {
        self.upsert_gate.wait_entered().await;
    }

    pub fn release_upsert(&self) {
        self.upsert_gate.release();
    }

    /// Make the next mark-as-read calls block until [`Self::release_mark_read`]
    pub fn hold_mark_read(&self) {
        self.mark_read_gate.hold();
    }

    pub async fn wait_mark_read_entered(&self) {
        self.mark_read_gate.wait_entered().await;
    }

    pub fn release_mark_read(&self) {
        self.mark_read_gate.release();
    }

    /// Direct access to the backing store, bypassing recording
    pub fn backing(&self) -> &SqliteDataLayer {
        &self.inner
    }
}

#[async_trait]
impl DataLayer for ScriptedDataLayer {
    async fn upsert_user(&self, email: &str, name: &str) -> Result<User> {
        self.upserts
            .lock()
            .unwrap()
            .push((email.to_string(), name.to_string()));
        self.upsert_gate.pass().await;
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(RewardsError::Storage("database unavailable".to_string()));
        }
        self.inner.upsert_user(email, name).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.inner.get_user_by_email(email).await
    }

    async fn get_user_balance(&self, user_id: UserId) -> Result<Decimal> {
        let balance = self.inner.get_user_balance(user_id).await;
        self.balance_gate.pass().await;
        balance
    }

    async fn get_available_rewards(&self, user_id: UserId) -> Result<Decimal> {
        self.inner.get_available_rewards(user_id).await
    }

    async fn get_unread_notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.inner.get_unread_notifications(user_id).await
    }

    async fn mark_notification_read(&self, notification_id: NotificationId) -> Result<()> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        self.mark_read_gate.pass().await;
        if self.fail_mark_read.load(Ordering::SeqCst) {
            return Err(RewardsError::Storage("database unavailable".to_string()));
        }
        self.inner.mark_notification_read(notification_id).await
    }

    async fn create_notification(
        &self,
        user_id: UserId,
        kind: &str,
        message: &str,
    ) -> Result<NotificationId> {
        self.inner.create_notification(user_id, kind, message).await
    }

    async fn record_transaction(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
    ) -> Result<Transaction> {
        self.inner
            .record_transaction(user_id, kind, amount, description)
            .await
    }

    async fn create_reward(&self, user_id: UserId, name: &str, points: Decimal) -> Result<Reward> {
        self.inner.create_reward(user_id, name, points).await
    }
}

/// Gateway configuration with the production retry shape and no settle wait
pub fn fast_gateway_config() -> GatewayConfig {
    GatewayConfig {
        client_id: TEST_CLIENT_ID.to_string(),
        init_policy: RetryPolicy::exponential(),
        settle_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
    }
}

/// Fully wired gateway over a mock provider, scripted data layer and in-memory cache
pub struct Harness {
    pub provider: Arc<MockIdentityProvider>,
    pub data: Arc<ScriptedDataLayer>,
    pub cache: Arc<MemorySessionCache>,
    pub store: SessionStore,
    pub gateway: AuthGateway,
}

impl Harness {
    pub fn new(identity: Identity) -> Self {
        Self::with_provider(MockIdentityProvider::new(identity), fast_gateway_config())
    }

    pub fn with_provider(provider: MockIdentityProvider, config: GatewayConfig) -> Self {
        let provider = Arc::new(provider);
        let data = Arc::new(ScriptedDataLayer::new());
        let cache = Arc::new(MemorySessionCache::new());
        let store = SessionStore::new(cache.clone());
        let gateway = AuthGateway::new(provider.clone(), data.clone(), store.clone(), config);

        Self {
            provider,
            data,
            cache,
            store,
            gateway,
        }
    }
}

/// Poll `condition` on the paused clock until it holds or `max_wait` elapses
pub async fn eventually(max_wait: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let step = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    while waited <= max_wait {
        if condition() {
            return true;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    condition()
}
