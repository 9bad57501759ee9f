/*
[INPUT]:  Provider session lifecycle requests from the auth gateway
[OUTPUT]: Provider-reported identities and connection status
[POS]:    Auth layer - external wallet-auth provider abstraction
[UPDATE]: When the provider contract gains operations or the mock gains scripting
*/

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Result, RewardsError};
use crate::types::Identity;

/// Third-party wallet-auth service.
///
/// Implementations report failures as `RewardsError::Provider` carrying the
/// service's own message so the gateway can classify it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Prepare the login flow. May be called again after a failure.
    async fn initialize(&self) -> Result<()>;

    /// Whether a provider session is currently established
    async fn is_connected(&self) -> bool;

    /// Run the interactive login and return the authenticated identity
    async fn connect(&self) -> Result<Identity>;

    /// Query the identity of the established session
    async fn current_user(&self) -> Result<Identity>;

    /// Tear down the provider session
    async fn disconnect(&self) -> Result<()>;
}

/// Number of calls a [`MockIdentityProvider`] has received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderCalls {
    pub initialize: u32,
    pub connect: u32,
    pub current_user: u32,
    pub disconnect: u32,
}

#[derive(Debug, Default)]
struct MockState {
    identity: Identity,
    connected: bool,
    init_failures: u32,
    init_error: String,
    connect_error: Option<String>,
    disconnect_error: Option<String>,
    calls: ProviderCalls,
}

/// Scriptable provider for tests and offline runs
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    state: Mutex<MockState>,
}

impl MockIdentityProvider {
    /// Provider whose login yields `identity`
    pub fn new(identity: Identity) -> Self {
        Self {
            state: Mutex::new(MockState {
                identity,
                ..MockState::default()
            }),
        }
    }

    /// Start with an established session, as if restored from a previous run
    pub fn already_connected(self) -> Self {
        self.lock().connected = true;
        self
    }

    /// Fail the next `times` initialize calls with `message`
    pub fn fail_initialize(&self, times: u32, message: &str) {
        let mut state = self.lock();
        state.init_failures = times;
        state.init_error = message.to_string();
    }

    /// Fail the next connect call with `message`
    pub fn fail_connect(&self, message: &str) {
        self.lock().connect_error = Some(message.to_string());
    }

    /// Fail every disconnect call with `message`
    pub fn fail_disconnect(&self, message: &str) {
        self.lock().disconnect_error = Some(message.to_string());
    }

    pub fn set_identity(&self, identity: Identity) {
        self.lock().identity = identity;
    }

    pub fn calls(&self) -> ProviderCalls {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn initialize(&self) -> Result<()> {
        let mut state = self.lock();
        state.calls.initialize += 1;
        if state.init_failures > 0 {
            state.init_failures -= 1;
            return Err(RewardsError::Provider(state.init_error.clone()));
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn connect(&self) -> Result<Identity> {
        let mut state = self.lock();
        state.calls.connect += 1;
        if let Some(message) = state.connect_error.take() {
            return Err(RewardsError::Provider(message));
        }
        state.connected = true;
        Ok(state.identity.clone())
    }

    async fn current_user(&self) -> Result<Identity> {
        let mut state = self.lock();
        state.calls.current_user += 1;
        if !state.connected {
            return Err(RewardsError::Provider("wallet not connected".to_string()));
        }
        Ok(state.identity.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.lock();
        state.calls.disconnect += 1;
        if let Some(message) = state.disconnect_error.clone() {
            return Err(RewardsError::Provider(message));
        }
        state.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_scripts_init_failures() {
        let provider = MockIdentityProvider::new(Identity::new("a@x.com", "Ann"));
        provider.fail_initialize(2, "Wallet is not ready yet");

        assert!(provider.initialize().await.is_err());
        assert!(provider.initialize().await.is_err());
        assert!(provider.initialize().await.is_ok());
        assert_eq!(provider.calls().initialize, 3);
    }

    #[tokio::test]
    async fn mock_provider_connect_lifecycle() {
        let provider = MockIdentityProvider::new(Identity::new("a@x.com", "Ann"));
        assert!(!provider.is_connected().await);
        assert!(provider.current_user().await.is_err());

        let identity = provider.connect().await.unwrap();
        assert_eq!(identity.verified_email(), Some("a@x.com"));
        assert!(provider.is_connected().await);

        provider.disconnect().await.unwrap();
        assert!(!provider.is_connected().await);
    }

    #[tokio::test]
    async fn mock_provider_connect_failure_is_one_shot() {
        let provider = MockIdentityProvider::new(Identity::new("a@x.com", "Ann"));
        provider.fail_connect("user rejected");

        assert!(provider.connect().await.is_err());
        assert!(!provider.is_connected().await);
        assert!(provider.connect().await.is_ok());
    }
}
