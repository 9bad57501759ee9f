/*
[INPUT]:  Provider configuration (client id, network, chain, RPC endpoints)
[OUTPUT]: IdentityProvider backed by the wallet-auth service's HTTP API
[POS]:    Auth layer - remote provider client
[UPDATE]: When provider endpoints or payloads change
*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, RewardsError};
use crate::types::Identity;

use super::provider::IdentityProvider;
use super::session_token::{DEFAULT_SESSION_SECONDS, SessionTokenManager};
use super::PLACEHOLDER_CLIENT_ID;

const DEFAULT_BASE_URL: &str = "https://api.web3auth.io";

/// Connection settings for the wallet-auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub client_id: String,
    pub base_url: String,
    /// Auth network of the provider project, e.g. `sapphire_devnet`
    pub network: String,
    pub chain_id: String,
    /// Tried in order; the first is sent as the RPC target
    pub rpc_endpoints: Vec<String>,
    pub session_seconds: u64,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: PLACEHOLDER_CLIENT_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            network: "sapphire_devnet".to_string(),
            chain_id: "0x1".to_string(),
            rpc_endpoints: vec![
                "https://ethereum.publicnode.com".to_string(),
                "https://rpc.builder0x69.io".to_string(),
                "https://rpc.ankr.com/eth".to_string(),
                "https://cloudflare-eth.com".to_string(),
            ],
            session_seconds: DEFAULT_SESSION_SECONDS,
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        super::client_id_configured(&self.client_id)
    }
}

#[derive(Debug, Serialize)]
struct InitRequest<'a> {
    client_id: &'a str,
    network: &'a str,
    chain_id: &'a str,
    rpc_target: Option<&'a str>,
    session_time: u64,
}

#[derive(Debug, Default, Deserialize)]
struct InitResponse {
    /// Present when the service restored a previous session
    #[serde(default)]
    session_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ConnectRequest<'a> {
    client_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    session_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    user: Identity,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

/// Wallet-auth service client
#[derive(Debug)]
pub struct HttpIdentityProvider {
    http_client: Client,
    base_url: Url,
    config: ProviderConfig,
    tokens: SessionTokenManager,
}

impl HttpIdentityProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self {
            http_client,
            base_url,
            config,
            tokens: SessionTokenManager::new(),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn tokens(&self) -> &SessionTokenManager {
        &self.tokens
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    fn authed_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let token = self
            .tokens
            .get_token()
            .ok_or_else(|| RewardsError::Provider("wallet not connected".to_string()))?;
        Ok(self.request(method, endpoint)?.bearer_auth(token))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|err| err.message)
                .unwrap_or(body);
            return Err(RewardsError::Provider(format!("{status}: {message}")));
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn token_lifetime(&self, expires_in: Option<u64>) -> u64 {
        expires_in.unwrap_or(self.config.session_seconds)
    }
}

fn transport_error(err: reqwest::Error) -> RewardsError {
    if err.is_connect() || err.is_timeout() {
        RewardsError::Provider(format!("network error: {err}"))
    } else {
        RewardsError::Http(err)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn initialize(&self) -> Result<()> {
        if !self.config.is_configured() {
            return Err(RewardsError::Config("client_id is missing or a placeholder".to_string()));
        }

        let body = InitRequest {
            client_id: &self.config.client_id,
            network: &self.config.network,
            chain_id: &self.config.chain_id,
            rpc_target: self.config.rpc_endpoints.first().map(String::as_str),
            session_time: self.config.session_seconds,
        };
        let builder = self.request(Method::POST, "/v1/sdk/init")?.json(&body);
        let response: InitResponse = self.send_json(builder).await?;

        if let Some(token) = response.session_token {
            let lifetime = self.token_lifetime(response.expires_in);
            self.tokens.set_token(token, lifetime);
            info!("provider restored an existing session");
        }
        debug!(network = %self.config.network, chain_id = %self.config.chain_id, "provider initialized");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        !self.tokens.is_expired()
    }

    async fn connect(&self) -> Result<Identity> {
        let body = ConnectRequest {
            client_id: &self.config.client_id,
        };
        let builder = self.request(Method::POST, "/v1/sdk/connect")?.json(&body);
        let response: ConnectResponse = self.send_json(builder).await?;

        let lifetime = self.token_lifetime(response.expires_in);
        self.tokens.set_token(response.session_token, lifetime);
        Ok(response.user)
    }

    async fn current_user(&self) -> Result<Identity> {
        let builder = self.authed_request(Method::GET, "/v1/sdk/user")?;
        self.send_json(builder).await
    }

    async fn disconnect(&self) -> Result<()> {
        let builder = match self.authed_request(Method::POST, "/v1/sdk/logout") {
            Ok(builder) => builder,
            // Nothing to tear down remotely
            Err(_) => return Ok(()),
        };

        let result = builder.send().await.map_err(transport_error);
        self.tokens.clear();

        let response = result?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RewardsError::Provider(format!("{status}: {message}")));
        }
        Ok(())
    }
}
