/*
[INPUT]:  Provider configuration and session lifecycle requests
[OUTPUT]: Identity provider clients, failure classification, auth gateway
[POS]:    Auth layer - session establishment and recovery
[UPDATE]: When auth flow or provider integration changes
*/

pub mod classify;
pub mod gateway;
pub mod http_provider;
pub mod provider;
pub mod session_token;

pub use classify::{InitFailure, LoginFailure};
pub use gateway::{AuthGateway, GatewayConfig};
pub use http_provider::{HttpIdentityProvider, ProviderConfig};
pub use provider::{IdentityProvider, MockIdentityProvider, ProviderCalls};
pub use session_token::{SessionToken, SessionTokenManager};

/// Value shipped in sample configuration; treated as "not configured"
pub const PLACEHOLDER_CLIENT_ID: &str = "YOUR_WEB3AUTH_CLIENT_ID";

/// Whether `client_id` is a usable provider credential
pub fn client_id_configured(client_id: &str) -> bool {
    let client_id = client_id.trim();
    !client_id.is_empty() && client_id != PLACEHOLDER_CLIENT_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_and_blank_ids_are_not_configured() {
        assert!(!client_id_configured(""));
        assert!(!client_id_configured("   "));
        assert!(!client_id_configured(PLACEHOLDER_CLIENT_ID));
        assert!(client_id_configured("BKR-real-client-id"));
    }
}
