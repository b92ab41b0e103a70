//! Application configuration.

use crate::error::{AppError, AppResult};
use alloy::primitives::Address;
use dexalot_registry::{CacheScope, PollSettings, RateFetcherConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Polling cadence of an in-memory directory feed (tokens, pairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Poll interval (ms). Default: 10,000.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl FetcherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Prices feed. Books it writes expire after `data_ttl_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricesConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Default: 15.
    #[serde(default = "default_data_ttl_secs")]
    pub data_ttl_secs: u64,
}

fn default_interval_ms() -> u64 {
    10_000
}

fn default_data_ttl_secs() -> u64 {
    15
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            data_ttl_secs: default_data_ttl_secs(),
        }
    }
}

impl PricesConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.interval_ms),
            data_ttl: Duration::from_secs(self.data_ttl_secs),
        }
    }
}

/// Denylist feed. Entries never expire, so only the interval matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistConfig {
    #[serde(default = "default_blacklist_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_blacklist_enabled() -> bool {
    true
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            enabled: default_blacklist_enabled(),
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Maker API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Chain id. Also part of the blacklist cache key.
    #[serde(default = "default_network")]
    pub network: u64,
    #[serde(default = "default_dex_key")]
    pub dex_key: String,
    /// Maker settlement contract, the EIP-712 verifying contract.
    #[serde(default = "default_maker")]
    pub maker: String,
    /// Sent as the `api_key` header on every request.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Gas units reported with indicative prices.
    #[serde(default = "default_gas_cost")]
    pub gas_cost: u64,
    /// Another process polls and fills the shared cache.
    #[serde(default)]
    pub is_slave: bool,
    /// Addresses whose signatures the maker contract accepts.
    #[serde(default)]
    pub authorized_signers: Vec<String>,
    #[serde(default)]
    pub tokens: FetcherConfig,
    #[serde(default)]
    pub pairs: FetcherConfig,
    #[serde(default)]
    pub prices: PricesConfig,
    #[serde(default)]
    pub blacklist: BlacklistConfig,
}

fn default_api_url() -> String {
    "https://api.dexalot.com".to_string()
}

fn default_network() -> u64 {
    43114
}

fn default_dex_key() -> String {
    "dexalot".to_string()
}

fn default_maker() -> String {
    "0xd62f9E53Be8884C21f5aa523B3c7D6F9a0050af5".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_gas_cost() -> u64 {
    120_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            network: default_network(),
            dex_key: default_dex_key(),
            maker: default_maker(),
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            gas_cost: default_gas_cost(),
            is_slave: false,
            authorized_signers: Vec::new(),
            tokens: FetcherConfig::default(),
            pairs: FetcherConfig::default(),
            prices: PricesConfig::default(),
            blacklist: BlacklistConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `explicit`, else `DEXALOT_CONFIG`, else
    /// `config/default.toml`.
    ///
    /// An explicit path must exist. Otherwise a missing file falls back to
    /// built-in defaults.
    pub fn load(explicit: Option<&str>) -> AppResult<Self> {
        if let Some(path) = explicit {
            tracing::info!(config_path = %path, "Loading configuration");
            return Self::from_file(path);
        }

        let config_path =
            std::env::var("DEXALOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            tracing::info!(config_path = %config_path, "Loading configuration");
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn maker_address(&self) -> AppResult<Address> {
        parse_address("maker", &self.maker)
    }

    pub fn signer_addresses(&self) -> AppResult<Vec<Address>> {
        self.authorized_signers
            .iter()
            .map(|s| parse_address("authorized_signers", s))
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_scope(&self) -> CacheScope {
        CacheScope::new(self.dex_key.clone(), self.network)
    }

    pub fn rate_fetcher_config(&self) -> RateFetcherConfig {
        RateFetcherConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            scope: self.cache_scope(),
            tokens_interval: self.tokens.interval(),
            pairs_interval: self.pairs.interval(),
            prices: self.prices.poll_settings(),
            blacklist_interval: self
                .blacklist
                .enabled
                .then(|| Duration::from_millis(self.blacklist.interval_ms)),
        }
    }
}

fn parse_address(field: &str, value: &str) -> AppResult<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| AppError::Config(format!("Invalid {field} address {value}: {e}")))
}
