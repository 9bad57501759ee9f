/*
[INPUT]:  YAML configuration file, ZERO2HERO__* and WEB3_AUTH_CLIENT_ID environment variables
[OUTPUT]: Parsed application configuration
[POS]:    Configuration layer - provider, storage and refresh settings
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use zero2hero_rewards::retry::exponential_backoff;
use zero2hero_rewards::{
    FileSessionCache, GatewayConfig, PollerConfig, ProviderConfig, RetryPolicy,
    client_id_configured,
};

/// Environment prefix for overrides, e.g. `ZERO2HERO__PROVIDER__CLIENT_ID`
pub const ENV_PREFIX: &str = "ZERO2HERO";
/// Fallback credential variable understood by existing deployments
pub const CLIENT_ID_ENV: &str = "WEB3_AUTH_CLIENT_ID";

/// Top-level configuration for the rewards client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Wallet-auth provider settings
    pub provider: ProviderConfig,
    /// SQLite database file; defaults to the user data directory
    pub database_path: Option<PathBuf>,
    /// Session cache file; defaults to the user data directory
    pub session_path: Option<PathBuf>,
    pub refresh: RefreshConfig,
    pub init: InitConfig,
}

/// Notification refresh cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub poll_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
        }
    }
}

/// Provider initialization behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InitConfig {
    pub max_attempts: u32,
    pub settle_delay_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle_delay_ms: 1000,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            database_path: None,
            session_path: None,
            refresh: RefreshConfig::default(),
            init: InitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from an optional YAML file layered under environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().context("read configuration sources")?;
        let mut config: Self = settings
            .try_deserialize()
            .context("parse configuration")?;
        config.apply_client_id_fallback(std::env::var(CLIENT_ID_ENV).ok());
        Ok(config)
    }

    /// Load configuration from a YAML file only
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
        let config: Self = serde_yaml::from_str(&content).context("parse YAML configuration")?;
        Ok(config)
    }

    fn apply_client_id_fallback(&mut self, fallback: Option<String>) {
        if self.provider.is_configured() {
            return;
        }
        if let Some(client_id) = fallback.filter(|id| client_id_configured(id)) {
            self.provider.client_id = client_id.trim().to_string();
        }
    }

    /// Reject settings the client cannot run with. A missing client id is
    /// allowed: it only disables login.
    pub fn validate(&self) -> Result<()> {
        if self.refresh.poll_interval_secs == 0 {
            bail!("refresh.poll_interval_secs must be greater than zero");
        }
        if self.init.max_attempts == 0 {
            bail!("init.max_attempts must be at least 1");
        }
        if self.provider.base_url.trim().is_empty() {
            bail!("provider.base_url must not be empty");
        }
        if self.provider.rpc_endpoints.is_empty() {
            bail!("provider.rpc_endpoints must list at least one endpoint");
        }
        if !self.provider.is_configured() {
            warn!(
                "provider.client_id is not configured; set {CLIENT_ID_ENV} or {ENV_PREFIX}__PROVIDER__CLIENT_ID to enable login"
            );
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            data_dir().join("rewards.db")
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(FileSessionCache::default_path)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            client_id: self.provider.client_id.clone(),
            init_policy: RetryPolicy::new(self.init.max_attempts, exponential_backoff),
            settle_delay: Duration::from_millis(self.init.settle_delay_ms),
            retry_delay: Duration::from_millis(self.init.retry_delay_ms),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.refresh.poll_interval_secs),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zero2hero")
}
