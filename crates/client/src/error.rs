//! Error types for the storage client

use alloy::primitives::TxHash;
use golembase_storagetx::StorageTxError;
use thiserror::Error;

/// Result type alias for storage client operations
pub type Result<T> = std::result::Result<T, StorageClientError>;

/// Errors that can occur while building, submitting or confirming a storage
/// transaction
#[derive(Debug, Error)]
pub enum StorageClientError {
    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote node cannot be reached
    ///
    /// The submitter raises it only before sending; transport failures while
    /// sending are [`StorageClientError::Indeterminate`].
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote node answered a read call with a JSON-RPC error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Local validation or encoding failed; nothing was sent
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(#[from] StorageTxError),

    /// Key or account failure while signing
    #[error("Signing error: {0}")]
    Signing(String),

    /// Account could not be loaded, parsed or stored
    #[error("Account error: {0}")]
    Account(String),

    /// Node refused the raw transaction
    #[error("Transaction rejected by node: {message}")]
    SubmissionRejected {
        /// Message returned by the node, verbatim
        message: String,
    },

    /// Transaction was included but its receipt reports failure
    #[error("Transaction {tx_hash} failed in block {}", block_label(.block_number))]
    TransactionFailed {
        tx_hash: TxHash,
        block_number: Option<u64>,
    },

    /// Successful receipt whose logs do not account for every operation
    #[error("Incomplete confirmation for transaction {tx_hash}: {detail}")]
    IncompleteConfirmation { tx_hash: TxHash, detail: String },

    /// Sending or waiting ended without a definite answer; on-chain fate unknown
    #[error("Transaction {tx_hash} outcome unknown: {reason}")]
    Indeterminate { tx_hash: TxHash, reason: String },

    /// Cancelled before the transaction was sent
    #[error("Cancelled before submission")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

fn block_label(block_number: &Option<u64>) -> String {
    block_number.map_or_else(|| "unknown".to_string(), |n| n.to_string())
}

impl StorageClientError {
    /// Transaction hash for errors raised after the transaction was sent
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::TransactionFailed { tx_hash, .. }
            | Self::IncompleteConfirmation { tx_hash, .. }
            | Self::Indeterminate { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }

    /// Check if the on-chain outcome of the transaction is unknown
    ///
    /// An indeterminate transaction may still be mined later and must be
    /// reconciled by looking up its hash.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Indeterminate { .. })
    }

    /// Check if this error indicates a configuration problem
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Account(_) | Self::Toml(_))
    }

    /// Check if the node cannot hold a copy of the transaction
    pub fn is_unsent(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Connection(_)
                | Self::Rpc(_)
                | Self::MalformedTransaction(_)
                | Self::Signing(_)
                | Self::Account(_)
                | Self::SubmissionRejected { .. }
                | Self::Cancelled
        )
    }
}
