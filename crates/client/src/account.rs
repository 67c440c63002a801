//! Accounts that sign storage transactions

use alloy::consensus::SignableTransaction;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Signature};
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StorageClientError};

/// Supplies the sender address and signs transaction envelopes
pub trait AccountProvider: Send + Sync {
    /// Address transactions are sent from
    fn address(&self) -> Address;

    /// Signs the envelope's signature hash
    fn sign_transaction(&self, tx: &mut dyn SignableTransaction<Signature>) -> Result<Signature>;
}

/// Account backed by an in-memory secp256k1 private key
#[derive(Clone)]
pub struct LocalAccount {
    signer: PrivateKeySigner,
}

impl LocalAccount {
    /// Generate a new random account
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Create an account from a hex private key, with or without `0x`
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let private_key = private_key.trim();
        let key_hex = private_key
            .strip_prefix("0x")
            .or_else(|| private_key.strip_prefix("0X"))
            .unwrap_or(private_key);

        let key_bytes = hex::decode(key_hex)
            .map_err(|e| StorageClientError::Account(format!("Invalid hex private key: {}", e)))?;

        let key_array: [u8; 32] = key_bytes.try_into().map_err(|bytes: Vec<u8>| {
            StorageClientError::Account(format!(
                "Private key must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;

        let signer = PrivateKeySigner::from_bytes(&key_array.into()).map_err(|e| {
            StorageClientError::Account(format!(
                "Failed to create signer from private key: {}",
                e
            ))
        })?;

        Ok(Self { signer })
    }

    /// Bind the signer to a chain; envelopes for other chains are refused
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.signer = self.signer.with_chain_id(chain_id);
        self
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.signer.chain_id()
    }

    /// Private key as 0x-prefixed hex
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signer.to_bytes()))
    }

    /// Load the account from a key file holding a hex private key
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StorageClientError::Account(format!(
                "Failed to read key file {}: {}",
                path.display(),
                e
            ))
        })?;
        let account = Self::from_private_key(&content)?;
        debug!("Loaded account {} from {}", account.address(), path.display());
        Ok(account)
    }

    /// Write the private key to `path`, creating parent directories.
    ///
    /// The file is readable by the owner only on unix.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.private_key_hex())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!("Saved account {} to {}", self.address(), path.display());
        Ok(())
    }

    /// `$XDG_CONFIG_HOME/golembase/private.key`, falling back to
    /// `$HOME/.config/golembase/private.key`
    pub fn default_key_path() -> Option<PathBuf> {
        let config_dir = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(config_dir.join("golembase").join("private.key"))
    }
}

impl fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id())
            .finish()
    }
}

impl AccountProvider for LocalAccount {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn sign_transaction(&self, tx: &mut dyn SignableTransaction<Signature>) -> Result<Signature> {
        self.signer
            .sign_transaction_sync(tx)
            .map_err(|e| StorageClientError::Signing(e.to_string()))
    }
}
