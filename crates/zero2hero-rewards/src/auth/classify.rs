/*
[INPUT]:  Raw error messages reported by the identity provider
[OUTPUT]: Classified login / initialization failures with user-facing text
[POS]:    Auth layer - maps provider error strings onto stable categories
[UPDATE]: When the provider changes its error wording or new categories are needed
*/

use std::fmt;

/// Why a login attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFailure {
    PopupBlocked,
    Network,
    Cancelled,
    NotReady,
    /// RPC authorization or API key trouble on the service side
    ServiceUnavailable,
    Other(String),
}

impl LoginFailure {
    /// Classify a provider error message. Matching is case-insensitive and
    /// the first matching category wins.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("popup") {
            LoginFailure::PopupBlocked
        } else if lower.contains("network") {
            LoginFailure::Network
        } else if lower.contains("user rejected") || lower.contains("user closed") {
            LoginFailure::Cancelled
        } else if lower.contains("not ready") {
            LoginFailure::NotReady
        } else if lower.contains("unauthorized") || lower.contains("api key") {
            LoginFailure::ServiceUnavailable
        } else {
            LoginFailure::Other(message.to_string())
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            LoginFailure::PopupBlocked => {
                "Login popup was blocked. Please allow popups and try again.".to_string()
            }
            LoginFailure::Network => {
                "Network error. Please check your internet connection.".to_string()
            }
            LoginFailure::Cancelled => "Login was cancelled by user.".to_string(),
            LoginFailure::NotReady => {
                "Authentication service is still initializing. Please wait and try again."
                    .to_string()
            }
            LoginFailure::ServiceUnavailable => {
                "Network service temporarily unavailable. Please try again in a few minutes."
                    .to_string()
            }
            LoginFailure::Other(message) => format!("Login error: {message}"),
        }
    }

    /// Whether trying again later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LoginFailure::Network | LoginFailure::NotReady | LoginFailure::ServiceUnavailable
        )
    }
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Category of an initialization failure, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFailure {
    InvalidClientId,
    ProjectConfigFetch,
    WalletNotReady,
    OAuth,
    RedirectUri,
    RpcUnauthorized,
    Unknown,
}

impl InitFailure {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("client_id") {
            InitFailure::InvalidClientId
        } else if lower.contains("failed to fetch project configurations") {
            InitFailure::ProjectConfigFetch
        } else if lower.contains("wallet is not ready yet") {
            InitFailure::WalletNotReady
        } else if lower.contains("oauth") {
            InitFailure::OAuth
        } else if lower.contains("redirect") {
            InitFailure::RedirectUri
        } else if lower.contains("unauthorized") || lower.contains("api key") {
            InitFailure::RpcUnauthorized
        } else {
            InitFailure::Unknown
        }
    }

    /// Diagnostic hint written to the log
    pub fn log_hint(&self) -> &'static str {
        match self {
            InitFailure::InvalidClientId => "invalid or missing client id",
            InitFailure::ProjectConfigFetch => {
                "network error or invalid client id; check connectivity and the client id"
            }
            InitFailure::WalletNotReady => "auth service is having issues; try again later",
            InitFailure::OAuth => "OAuth configuration issue; check the provider project's login methods",
            InitFailure::RedirectUri => "redirect URI configuration issue; check the provider project settings",
            InitFailure::RpcUnauthorized => "RPC endpoint authentication issue; likely temporary",
            InitFailure::Unknown => "unclassified initialization failure",
        }
    }

    /// Message shown when a user-triggered retry fails
    pub fn retry_user_message(&self) -> &'static str {
        match self {
            InitFailure::ProjectConfigFetch => {
                "Configuration fetch failed. Please check your internet connection and verify your client ID is correct."
            }
            _ => "Retry failed. Please check your Web3Auth configuration.",
        }
    }
}
