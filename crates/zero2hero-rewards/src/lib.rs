/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public rewards client core surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod data;
pub mod error;
pub mod events;
pub mod poller;
pub mod retry;
pub mod session;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AuthGateway,
    GatewayConfig,
    HttpIdentityProvider,
    IdentityProvider,
    InitFailure,
    LoginFailure,
    MockIdentityProvider,
    PLACEHOLDER_CLIENT_ID,
    ProviderConfig,
    client_id_configured,
};

pub use data::{DataLayer, SqliteDataLayer};
pub use error::{Result, RewardsError};
pub use events::{BalanceBus, BalanceUpdated};
pub use poller::{NotificationPoller, PollerConfig, PollerHandle};
pub use retry::{RetryError, RetryPolicy, retry_with_backoff};
pub use session::{FileSessionCache, MemorySessionCache, SessionCache, SessionState, SessionStore};

// Re-export all types
pub use types::*;
