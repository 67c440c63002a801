//! Golem Base storage client
//!
//! Submits storage transactions to a Golem Base node and turns their receipts
//! into confirmed outcomes.
//!
//! - [`config`]: client configuration (TOML, environment)
//! - [`account`]: the signing account
//! - [`builder`]: EIP-1559 envelope construction and signing
//! - [`node`]: the remote node interface and its alloy implementation
//! - [`submit`]: the submission and confirmation pipeline
//!
//! # Example
//!
//! ```no_run
//! use golembase_client::{AlloyNode, ClientConfig, LocalAccount, Submitter};
//! use golembase_storagetx::{Create, StorageTransaction};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> golembase_client::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let account = LocalAccount::from_private_key("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")?;
//! let node = AlloyNode::connect(&config.node_url)?;
//! let submitter = Submitter::from_config(node, account, &config)?;
//!
//! let tx = StorageTransaction::new()
//!     .with_create(Create::new(100, b"hello".to_vec()).with_string_annotation("foo", "bar"));
//! let confirmation = submitter.submit(&tx, &CancellationToken::new()).await?;
//! println!("created {:?}", confirmation.created_keys());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod builder;
pub mod config;
pub mod error;
pub mod node;
pub mod submit;

pub use account::{AccountProvider, LocalAccount};
pub use builder::{SignedStorageTransaction, TransactionBuilder, TransactionPolicy};
pub use config::{ClientConfig, DEFAULT_NODE_URL, STORAGE_PROCESSOR_ADDRESS};
pub use error::{Result, StorageClientError};
pub use node::{AlloyNode, Receipt, SearchResult, StorageNode};
pub use submit::{Confirmation, Submitter, confirm};

/// Re-export the storage transaction model for convenience
pub use golembase_storagetx as storagetx;
