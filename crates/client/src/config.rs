//! Configuration types for the storage client

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::builder::TransactionPolicy;
use crate::error::{Result, StorageClientError};

/// Default node URL, a local development node
pub const DEFAULT_NODE_URL: &str = "http://localhost:8545";

/// Well-known address of the Golem Base storage processor
pub const STORAGE_PROCESSOR_ADDRESS: &str = "0x0000000000000000000000000000000060138453";

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Configuration for the storage client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON-RPC URL of the Golem Base node
    /// Example: "http://localhost:8545"
    pub node_url: String,

    /// Expected chain ID (optional)
    /// When set, submission fails if the node reports a different chain and
    /// the signer refuses transactions for any other chain
    pub chain_id: Option<u64>,

    /// Destination of storage transactions
    /// Must be a valid Ethereum address (0x-prefixed, 42 characters)
    pub storage_processor_address: String,

    /// Gas limit of every storage transaction
    pub gas_limit: u64,

    /// Priority fee cap in gwei (default 1)
    pub max_priority_fee_gwei: u64,

    /// Total fee cap in gwei (default 5)
    pub max_fee_gwei: u64,

    /// Interval between receipt lookups while waiting for inclusion
    pub poll_interval_ms: u64,

    /// Give up waiting for a receipt after this many seconds (optional)
    /// The outcome is then reported as indeterminate
    pub confirmation_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.to_string(),
            chain_id: None,
            storage_processor_address: STORAGE_PROCESSOR_ADDRESS.to_string(),
            gas_limit: 1_000_000,
            max_priority_fee_gwei: 1,
            max_fee_gwei: 5,
            poll_interval_ms: 500,
            confirmation_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from TOML string
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml)?;
        config.validate().map_err(|e| {
            StorageClientError::Configuration(format!("Configuration validation failed: {}", e))
        })?;
        Ok(config)
    }

    /// Default configuration with overrides from the environment
    ///
    /// Reads `.env` if present, then `NODE_URL` and `CHAIN_ID`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(node_url) = std::env::var("NODE_URL") {
            config.node_url = node_url;
        }

        if let Ok(chain_id) = std::env::var("CHAIN_ID") {
            let chain_id = chain_id.parse::<u64>().map_err(|e| {
                StorageClientError::Configuration(format!("Invalid CHAIN_ID '{}': {}", chain_id, e))
            })?;
            config.chain_id = Some(chain_id);
        }

        config.validate().map_err(StorageClientError::Configuration)?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// Returns `Ok(())` if valid, otherwise returns error message
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.node_url.is_empty() {
            return Err("node_url cannot be empty".to_string());
        }

        if !self.node_url.starts_with("http://") && !self.node_url.starts_with("https://") {
            return Err("node_url must start with http:// or https://".to_string());
        }

        if !self.storage_processor_address.starts_with("0x") {
            return Err("storage_processor_address must start with 0x".to_string());
        }

        if self.storage_processor_address.len() != 42 {
            return Err(format!(
                "storage_processor_address must be 42 characters (0x + 40 hex), got {}",
                self.storage_processor_address.len()
            ));
        }

        if !self.storage_processor_address[2..]
            .chars()
            .all(|c| c.is_ascii_hexdigit())
        {
            return Err(
                "storage_processor_address must contain only hex characters after 0x".to_string(),
            );
        }

        if self.gas_limit == 0 {
            return Err("gas_limit must be > 0".to_string());
        }

        if self.max_fee_gwei == 0 {
            return Err("max_fee_gwei must be > 0".to_string());
        }

        if self.max_priority_fee_gwei > self.max_fee_gwei {
            return Err("max_priority_fee_gwei cannot exceed max_fee_gwei".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be > 0".to_string());
        }

        if self.poll_interval_ms > 60_000 {
            return Err("poll_interval_ms too large (max 1 minute)".to_string());
        }

        if self.confirmation_timeout_secs == Some(0) {
            return Err("confirmation_timeout_secs must be > 0 when set".to_string());
        }

        Ok(())
    }

    /// Immutable transaction policy derived from this configuration
    pub fn transaction_policy(&self) -> Result<TransactionPolicy> {
        let storage_processor = Address::from_str(&self.storage_processor_address).map_err(|e| {
            StorageClientError::Configuration(format!(
                "Invalid storage processor address '{}': {}",
                self.storage_processor_address, e
            ))
        })?;

        Ok(TransactionPolicy {
            storage_processor,
            gas_limit: self.gas_limit,
            max_priority_fee_per_gas: u128::from(self.max_priority_fee_gwei) * WEI_PER_GWEI,
            max_fee_per_gas: u128::from(self.max_fee_gwei) * WEI_PER_GWEI,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }
}
