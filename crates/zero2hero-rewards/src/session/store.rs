/*
[INPUT]:  Gateway and poller mutations, session cache
[OUTPUT]: Latest SessionState snapshots via `watch`
[POS]:    Session layer - the single owned session state object
[UPDATE]: When adding session fields or changing an operation's update contract
*/

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{AuthStatus, Identity, Notification, NotificationId};

use super::cache::SessionCache;

/// Client-side session state rendered by the presentation layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub status: AuthStatus,
    pub loading: bool,
    /// Client credential missing or placeholder; login stays disabled
    pub setup_required: bool,
    pub balance: Decimal,
    pub notifications: Vec<Notification>,
    /// Email read from the local cache on startup
    pub persisted_email: Option<String>,
    /// Available rewards for the persisted email
    pub total_earnings: Decimal,
    pub balance_revision: u64,
}

impl SessionState {
    pub fn auth_ready(&self) -> bool {
        self.status.is_ready()
    }

    pub fn signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn verified_email(&self) -> Option<&str> {
        self.identity.as_ref().and_then(Identity::verified_email)
    }

    pub fn balance_revision(&self) -> u64 {
        self.balance_revision
    }
}

/// Shared handle onto the session state.
///
/// Every mutation goes through one `watch` update so observers never see a
/// half-applied operation.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
    cache: Arc<dyn SessionCache>,
}

impl SessionStore {
    /// Create a store and rehydrate the persisted email from `cache`
    pub fn new(cache: Arc<dyn SessionCache>) -> Self {
        let persisted_email = match cache.load_email() {
            Ok(email) => email,
            Err(err) => {
                warn!(error = %err, "failed to read session cache; starting signed out");
                None
            }
        };

        let initial = SessionState {
            loading: true,
            persisted_email,
            ..SessionState::default()
        };
        let (tx, _rx) = watch::channel(initial);

        Self {
            state: Arc::new(tx),
            cache,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Apply `f` as one atomic update and notify observers
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(f);
    }

    pub fn set_status(&self, status: AuthStatus) {
        self.update(|state| state.status = status);
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        });
    }

    /// Record a provider-confirmed identity.
    ///
    /// The email is persisted first; if that fails nothing in memory changes.
    /// Switching to a different email resets balance and notifications.
    pub fn sign_in(&self, identity: Identity) -> Result<()> {
        if let Some(email) = identity.verified_email() {
            self.cache.save_email(email)?;
        }

        let email = identity.verified_email().map(str::to_string);
        self.update(|state| {
            if state.verified_email() != email.as_deref() {
                state.balance = Decimal::ZERO;
                state.notifications.clear();
                state.balance_revision += 1;
            }
            if email.is_some() {
                state.persisted_email = email.clone();
            }
            state.identity = Some(identity);
        });
        Ok(())
    }

    /// Clear identity, balance, notifications and the persisted email.
    ///
    /// The cache is cleared first; if that fails nothing in memory changes.
    pub fn sign_out(&self) -> Result<()> {
        self.cache.clear()?;
        self.update(|state| {
            state.identity = None;
            state.balance = Decimal::ZERO;
            state.notifications.clear();
            state.persisted_email = None;
            state.balance_revision += 1;
        });
        Ok(())
    }

    /// Adopt an out-of-band balance immediately. Ignored while signed out.
    pub fn apply_balance_event(&self, balance: Decimal) -> bool {
        self.state.send_if_modified(|state| {
            if state.verified_email().is_none() {
                debug!(%balance, "ignoring balance update while signed out");
                return false;
            }
            state.balance = balance;
            state.balance_revision += 1;
            true
        })
    }

    /// Apply a fetched balance only if `email` is still signed in and no
    /// balance event or identity change happened since the fetch started at
    /// `revision`. Fetches do not advance the revision themselves.
    pub fn apply_fetched_balance(&self, email: &str, revision: u64, balance: Decimal) -> bool {
        self.state.send_if_modified(|state| {
            if state.verified_email() != Some(email) {
                debug!(email, "dropping balance fetched for a previous identity");
                return false;
            }
            if state.balance_revision != revision {
                debug!(email, "dropping balance fetch overtaken by a newer update");
                return false;
            }
            state.balance = balance;
            true
        })
    }

    /// Replace the notification list wholesale if `email` is still signed in
    pub fn replace_notifications(&self, email: &str, notifications: Vec<Notification>) -> bool {
        self.state.send_if_modified(|state| {
            if state.verified_email() != Some(email) {
                debug!(email, "dropping notifications fetched for a previous identity");
                return false;
            }
            state.notifications = notifications;
            true
        })
    }

    /// Remove one notification from the displayed list
    pub fn remove_notification(&self, id: NotificationId) -> bool {
        self.state.send_if_modified(|state| {
            let before = state.notifications.len();
            state.notifications.retain(|notification| notification.id != id);
            state.notifications.len() != before
        })
    }

    pub fn set_total_earnings(&self, total: Decimal) {
        self.update(|state| state.total_earnings = total);
    }
}
