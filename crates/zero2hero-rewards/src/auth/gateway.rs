/*
[INPUT]:  Identity provider, data layer, session store, cancellation token
[OUTPUT]: Auth lifecycle transitions applied to the session store
[POS]:    Auth layer - initialize / connect / disconnect / refresh orchestration
[UPDATE]: When the auth state machine or login side effects change
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::data::DataLayer;
use crate::error::{Result, RewardsError};
use crate::retry::{RetryError, RetryPolicy, retry_with_backoff};
use crate::session::SessionStore;
use crate::types::{AuthStatus, Identity};

use super::classify::{InitFailure, LoginFailure};
use super::provider::IdentityProvider;
use super::{PLACEHOLDER_CLIENT_ID, client_id_configured};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub client_id: String,
    pub init_policy: RetryPolicy,
    /// Wait after a successful initialize before reporting `Ready`
    pub settle_delay: Duration,
    /// Wait before a user-triggered re-initialization attempt
    pub retry_delay: Duration,
}

impl GatewayConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        client_id_configured(&self.client_id)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            client_id: PLACEHOLDER_CLIENT_ID.to_string(),
            init_policy: RetryPolicy::exponential(),
            settle_delay: Duration::from_secs(1),
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Drives the identity provider and mirrors its outcome into the session store
#[derive(Clone)]
pub struct AuthGateway {
    provider: Arc<dyn IdentityProvider>,
    data: Arc<dyn DataLayer>,
    store: SessionStore,
    config: GatewayConfig,
}

impl fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGateway")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataLayer>,
        store: SessionStore,
        config: GatewayConfig,
    ) -> Self {
        Self {
            provider,
            data,
            store,
            config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn status(&self) -> AuthStatus {
        self.store.snapshot().status
    }

    /// Prepare the provider with bounded retry.
    ///
    /// Ends in `Ready` or `Failed`; never leaves the gateway `Initializing`.
    /// An already-established provider session is restored before `Ready`.
    pub async fn initialize(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.config.is_configured() {
            return Err(self.mark_setup_required());
        }
        if !self.begin_initializing() {
            debug!("initialization already in progress");
            return Err(RewardsError::NotReady);
        }

        let provider = Arc::clone(&self.provider);
        let result = retry_with_backoff(
            self.config.init_policy,
            cancel,
            "provider_initialize",
            |attempt| {
                let provider = Arc::clone(&provider);
                async move {
                    debug!(attempt, "initializing identity provider");
                    provider.initialize().await
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.finish(AuthStatus::Failed);
                        return Err(RewardsError::Cancelled);
                    }
                    _ = tokio::time::sleep(self.config.settle_delay) => {}
                }

                self.restore_session().await;
                self.finish(AuthStatus::Ready);
                info!("identity provider ready");
                Ok(())
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                let message = provider_message(&last);
                let category = InitFailure::classify(&message);
                error!(attempts, error = %message, hint = category.log_hint(), "identity provider initialization failed");
                self.finish(AuthStatus::Failed);
                Err(RewardsError::Initialization { attempts, message })
            }
            Err(RetryError::Cancelled { attempts }) => {
                warn!(attempts, "identity provider initialization cancelled");
                self.finish(AuthStatus::Failed);
                Err(RewardsError::Cancelled)
            }
        }
    }

    /// One more initialization attempt after `retry_delay`, triggered by the user.
    ///
    /// No-op when already `Ready`.
    pub async fn retry_initialize(&self, cancel: &CancellationToken) -> Result<()> {
        if !self.config.is_configured() {
            return Err(self.mark_setup_required());
        }
        if self.store.snapshot().auth_ready() {
            return Ok(());
        }
        if !self.begin_initializing() {
            return Err(RewardsError::NotReady);
        }

        info!("retrying identity provider initialization");
        tokio::select! {
            _ = cancel.cancelled() => {
                self.finish(AuthStatus::Failed);
                return Err(RewardsError::Cancelled);
            }
            _ = tokio::time::sleep(self.config.retry_delay) => {}
        }

        match self.provider.initialize().await {
            Ok(()) => {
                self.restore_session().await;
                self.finish(AuthStatus::Ready);
                info!("identity provider ready after retry");
                Ok(())
            }
            Err(err) => {
                let message = provider_message(&err);
                let category = InitFailure::classify(&message);
                error!(error = %message, hint = category.log_hint(), "initialization retry failed");
                self.finish(AuthStatus::Failed);
                Err(RewardsError::Initialization {
                    attempts: 1,
                    message: category.retry_user_message().to_string(),
                })
            }
        }
    }

    /// Interactive login.
    ///
    /// Fails fast without calling the provider unless the gateway is `Ready`
    /// and the client id is configured, or while another login is in flight.
    /// A failed login leaves the session unchanged.
    pub async fn connect(&self) -> Result<Identity> {
        if !self.config.is_configured() {
            error!("login attempted without a configured client id");
            return Err(RewardsError::Config("client id is missing".to_string()));
        }
        self.begin_login()?;
        info!("connecting to identity provider");

        let outcome = match self.provider.connect().await {
            Ok(identity) => self.establish(identity).await,
            Err(err) => {
                let failure = LoginFailure::classify(&provider_message(&err));
                error!(error = %err, ?failure, "login failed");
                Err(RewardsError::Login(failure))
            }
        };

        self.store.set_loading(false);
        outcome
    }

    /// Sign out. Provider errors are logged and local state is still cleared,
    /// unless the session cache itself cannot be cleared.
    pub async fn disconnect(&self) -> Result<()> {
        if let Err(err) = self.provider.disconnect().await {
            error!(error = %err, "provider logout failed; clearing local session anyway");
        }
        self.store.sign_out()?;
        info!("signed out");
        Ok(())
    }

    /// Re-query the provider's identity and mirror it again.
    ///
    /// Returns `None` when no provider session exists.
    pub async fn refresh_identity(&self) -> Result<Option<Identity>> {
        if !self.provider.is_connected().await {
            debug!("no provider session to refresh");
            return Ok(None);
        }

        let identity = self.provider.current_user().await?;
        self.establish(identity).await.map(Some)
    }

    /// Record the identity, persist its email, and upsert the user record.
    /// Upsert failures are logged and do not fail the login.
    async fn establish(&self, identity: Identity) -> Result<Identity> {
        self.store.sign_in(identity.clone())?;

        match identity.verified_email() {
            Some(email) => match self.data.upsert_user(email, identity.display_name()).await {
                Ok(user) => debug!(user_id = user.id, email, "user record mirrored"),
                // TODO: decide with product whether a failed mirror should fail the login
                Err(err) => error!(error = %err, email, "failed to mirror user record"),
            },
            None => warn!("provider identity has no email; user record not mirrored"),
        }

        Ok(identity)
    }

    async fn restore_session(&self) {
        match self.refresh_identity().await {
            Ok(Some(identity)) => {
                info!(email = identity.verified_email().unwrap_or_default(), "restored provider session")
            }
            Ok(None) => debug!("provider not connected; ready for login"),
            Err(err) => warn!(error = %err, "failed to restore provider session"),
        }
    }

    /// Move to `Initializing` unless another initialization is running
    fn begin_initializing(&self) -> bool {
        let mut started = false;
        self.store.update(|state| {
            if state.status != AuthStatus::Initializing {
                state.status = AuthStatus::Initializing;
                state.loading = true;
                state.setup_required = false;
                started = true;
            }
        });
        started
    }

    /// Claim the loading flag for a login. Fails while not `Ready` or while
    /// another login holds the flag.
    fn begin_login(&self) -> Result<()> {
        let mut outcome = Ok(());
        self.store.update(|state| {
            if !state.auth_ready() {
                debug!("login attempted before the identity provider is ready");
                outcome = Err(RewardsError::NotReady);
            } else if state.loading {
                debug!("login attempted while another login is in flight");
                outcome = Err(RewardsError::LoginInProgress);
            } else {
                state.loading = true;
            }
        });
        outcome
    }

    fn finish(&self, status: AuthStatus) {
        self.store.update(|state| {
            state.status = status;
            state.loading = false;
        });
    }

    fn mark_setup_required(&self) -> RewardsError {
        warn!("identity provider client id not configured; login disabled");
        self.store.update(|state| {
            state.setup_required = true;
            state.loading = false;
        });
        RewardsError::Config("client id is missing or a placeholder".to_string())
    }
}

/// The provider's own wording, used for classification
fn provider_message(err: &RewardsError) -> String {
    match err {
        RewardsError::Provider(message) => message.clone(),
        RewardsError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
