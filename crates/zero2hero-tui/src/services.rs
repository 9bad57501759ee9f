/*
[INPUT]:  AppConfig, identity provider, data layer, session cache, shutdown token
[OUTPUT]: Wired gateway, poller and session store shared by the presentation layer
[POS]:    Composition root - builds the client core for the binary and tests
[UPDATE]: When the client core gains a service or startup ordering changes
*/

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use zero2hero_rewards::{
    AuthGateway, BalanceBus, DataLayer, FileSessionCache, HttpIdentityProvider, IdentityProvider,
    NotificationPoller, PollerHandle, RewardsError, SessionStore, SqliteDataLayer,
};

use crate::config::AppConfig;

/// Everything the presentation layer routes intents to
#[derive(Debug, Clone)]
pub struct ClientServices {
    pub store: SessionStore,
    pub gateway: AuthGateway,
    pub poller: NotificationPoller,
    pub bus: BalanceBus,
    shutdown: CancellationToken,
}

impl ClientServices {
    /// Production wiring: HTTP provider, SQLite file store, JSON session cache
    pub fn from_config(config: &AppConfig, shutdown: CancellationToken) -> Result<Self> {
        let session_path = config.session_path();
        let database_path = config.database_path();

        let store = SessionStore::new(Arc::new(FileSessionCache::new(&session_path)));
        let data = SqliteDataLayer::open(&database_path)
            .with_context(|| format!("open rewards database {}", database_path.display()))?;
        let provider =
            HttpIdentityProvider::new(config.provider.clone()).context("build identity provider")?;

        info!(
            database = %database_path.display(),
            session = %session_path.display(),
            "client services configured"
        );

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(data),
            store,
            config,
            shutdown,
        ))
    }

    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataLayer>,
        store: SessionStore,
        config: &AppConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let bus = BalanceBus::new();
        let gateway = AuthGateway::new(
            provider,
            Arc::clone(&data),
            store.clone(),
            config.gateway_config(),
        );
        let poller = NotificationPoller::new(data, store.clone(), bus.clone(), config.poller_config());

        Self {
            store,
            gateway,
            poller,
            bus,
            shutdown,
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start background work: provider initialization and the poller.
    ///
    /// Initialization runs detached so the first frame renders immediately.
    pub fn start(&self) -> PollerHandle {
        let gateway = self.gateway.clone();
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            match gateway.initialize(&cancel).await {
                Ok(()) => {}
                Err(RewardsError::Config(_)) => info!("login disabled until a client id is configured"),
                Err(RewardsError::Cancelled) => {}
                Err(err) => warn!(error = %err, "identity provider unavailable; retry from the header"),
            }
        });

        self.poller.spawn(&self.shutdown)
    }
}
