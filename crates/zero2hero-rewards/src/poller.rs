/*
[INPUT]:  SessionStore identity changes, DataLayer reads, BalanceBus events, CancellationToken
[OUTPUT]: Balance, unread notifications and total earnings applied to the session store
[POS]:    Refresh layer - 30s notification poll, out-of-band balance events, optimistic dismiss
[UPDATE]: When refresh cadence, fetch set or dismiss semantics change
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data::DataLayer;
use crate::error::Result;
use crate::events::{BalanceBus, BalanceUpdated};
use crate::session::SessionStore;
use crate::types::{NotificationId, User};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Keeps balance and notifications in the session store current for the signed-in identity
#[derive(Clone)]
pub struct NotificationPoller {
    data: Arc<dyn DataLayer>,
    store: SessionStore,
    bus: BalanceBus,
    config: PollerConfig,
}

impl fmt::Debug for NotificationPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationPoller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NotificationPoller {
    pub fn new(
        data: Arc<dyn DataLayer>,
        store: SessionStore,
        bus: BalanceBus,
        config: PollerConfig,
    ) -> Self {
        Self {
            data,
            store,
            bus,
            config,
        }
    }

    /// Start the fetch loop and the balance listener under a child of `parent`.
    pub fn spawn(&self, parent: &CancellationToken) -> PollerHandle {
        let cancel = parent.child_token();
        // Subscribe before spawning so events published right after spawn are seen.
        let balance_rx = self.bus.subscribe();

        let fetch = tokio::spawn(self.clone().run_fetch_loop(cancel.clone()));
        let listen = tokio::spawn(self.clone().run_balance_listener(balance_rx, cancel.clone()));

        PollerHandle {
            cancel,
            tasks: vec![fetch, listen],
        }
    }

    /// Fetch notifications and balance for the current identity now
    pub async fn refresh(&self) {
        let snapshot = self.store.snapshot();
        if let Some(email) = snapshot.verified_email() {
            self.fetch_all(email).await;
        }
    }

    /// Remove a notification from the displayed list, then mark it read.
    ///
    /// Mark-as-read failures are logged; the next poll shows the item again
    /// if it is still unread.
    pub async fn dismiss_notification(&self, id: NotificationId) {
        let removed = self.store.remove_notification(id);
        debug!(notification_id = id, removed, "notification dismissed");

        if let Err(err) = self.data.mark_notification_read(id).await {
            warn!(notification_id = id, error = %err, "failed to mark notification read");
        }
    }

    /// Total available rewards for the persisted email, published to the store
    pub async fn load_total_earnings(&self) -> Result<Decimal> {
        let Some(email) = self.store.snapshot().persisted_email else {
            return Ok(Decimal::ZERO);
        };

        let total = match self.data.get_user_by_email(&email).await? {
            Some(user) => self.data.get_available_rewards(user.id).await?,
            None => Decimal::ZERO,
        };
        self.store.set_total_earnings(total);
        Ok(total)
    }

    async fn run_fetch_loop(self, cancel: CancellationToken) {
        let mut identity_rx = self.store.subscribe();
        let mut current_email: Option<String> = None;

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        match self.load_total_earnings().await {
            Ok(total) => debug!(%total, "total earnings loaded"),
            Err(err) => warn!(error = %err, "failed to load total earnings"),
        }

        loop {
            let email = identity_rx
                .borrow_and_update()
                .verified_email()
                .map(str::to_string);

            if email != current_email {
                current_email = email;
                if let Some(email) = current_email.as_deref() {
                    info!(email, "identity changed; fetching balance and notifications");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.fetch_all(email) => {}
                    }
                    ticker.reset();
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = identity_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Some(email) = current_email.as_deref() {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = self.fetch_notifications(email) => {}
                        }
                    }
                }
            }
        }

        debug!("notification poller stopped");
    }

    async fn run_balance_listener(
        self,
        mut balance_rx: broadcast::Receiver<BalanceUpdated>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = balance_rx.recv() => match event {
                    Ok(BalanceUpdated(balance)) => {
                        if self.store.apply_balance_event(balance) {
                            debug!(%balance, "balance updated out of band");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "balance listener lagged; continuing with newest events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        debug!("balance listener stopped");
    }

    async fn lookup_user(&self, email: &str) -> Option<User> {
        match self.data.get_user_by_email(email).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!(email, "no user record yet");
                None
            }
            Err(err) => {
                warn!(email, error = %err, "failed to look up user");
                None
            }
        }
    }

    async fn fetch_all(&self, email: &str) {
        let revision = self.store.snapshot().balance_revision();
        let Some(user) = self.lookup_user(email).await else {
            return;
        };

        self.apply_notifications(email, &user).await;

        match self.data.get_user_balance(user.id).await {
            Ok(balance) => {
                if self.store.apply_fetched_balance(email, revision, balance) {
                    debug!(email, %balance, "balance fetched");
                }
            }
            Err(err) => warn!(email, error = %err, "failed to fetch balance"),
        }
    }

    async fn fetch_notifications(&self, email: &str) {
        if let Some(user) = self.lookup_user(email).await {
            self.apply_notifications(email, &user).await;
        }
    }

    async fn apply_notifications(&self, email: &str, user: &User) {
        match self.data.get_unread_notifications(user.id).await {
            Ok(notifications) => {
                let count = notifications.len();
                if self.store.replace_notifications(email, notifications) {
                    debug!(email, count, "notifications refreshed");
                }
            }
            Err(err) => warn!(email, error = %err, "failed to fetch notifications"),
        }
    }
}

/// Owner of the poller tasks. Dropping it stops them.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Cancel and wait for both tasks to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(err) = task.await {
                warn!(error = %err, "poller task ended abnormally");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
