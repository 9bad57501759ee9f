/*
[INPUT]:  Mock identity provider, in-memory SQLite store, memory session cache
[OUTPUT]: Client services wired for presentation-layer tests
[POS]:    Test infrastructure - shared across TUI test modules
[UPDATE]: When ClientServices wiring changes
*/

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use zero2hero_rewards::{
    DataLayer, Identity, MemorySessionCache, MockIdentityProvider, SessionStore, SqliteDataLayer,
};
use zero2hero_tui::tui::{AppState, new_log_buffer};
use zero2hero_tui::{AppConfig, ClientServices};

pub const TEST_CLIENT_ID: &str = "BKR-tui-test-client";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.provider.client_id = TEST_CLIENT_ID.to_string();
    config.init.settle_delay_ms = 0;
    config.init.retry_delay_ms = 0;
    config
}

pub struct TestClient {
    pub provider: Arc<MockIdentityProvider>,
    pub data: Arc<SqliteDataLayer>,
    pub services: ClientServices,
    pub shutdown: CancellationToken,
}

impl TestClient {
    pub fn new(identity: Identity) -> Self {
        Self::with_config(identity, test_config())
    }

    pub fn with_config(identity: Identity, config: AppConfig) -> Self {
        let provider = Arc::new(MockIdentityProvider::new(identity));
        let data = Arc::new(SqliteDataLayer::in_memory().expect("in-memory database"));
        let store = SessionStore::new(Arc::new(MemorySessionCache::new()));
        let shutdown = CancellationToken::new();
        let services = ClientServices::new(
            provider.clone(),
            data.clone() as Arc<dyn DataLayer>,
            store,
            &config,
            shutdown.clone(),
        );
        Self {
            provider,
            data,
            services,
            shutdown,
        }
    }

    pub fn app(&self) -> AppState {
        AppState::new(self.services.store.snapshot(), new_log_buffer())
    }
}

/// Poll `condition` until it holds or `max_wait` passes
pub async fn eventually(max_wait: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + max_wait;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
