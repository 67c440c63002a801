//! Remote Golem Base node access
//!
//! [`StorageNode`] is the narrow interface the submission pipeline needs from
//! the remote node. [`AlloyNode`] implements it over an alloy HTTP provider.

use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::http::reqwest::Url;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use golembase_storagetx::EntityKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{Result, StorageClientError};

/// JSON-RPC method of the query endpoint
pub const QUERY_ENTITIES_METHOD: &str = "golembase_queryEntities";

/// Receipt of an included transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// Execution status, `true` when every operation was applied
    pub success: bool,
    pub logs: Vec<Log>,
}

impl From<TransactionReceipt> for Receipt {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}

/// Entity returned by the query endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub key: EntityKey,
    /// Payload, base64 on the wire
    #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
    pub value: Bytes,
}

fn serialize_base64<S: Serializer>(value: &Bytes, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(value))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Bytes, D::Error> {
    let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    STANDARD
        .decode(encoded.as_bytes())
        .map(Bytes::from)
        .map_err(serde::de::Error::custom)
}

/// Operations the client needs from a Golem Base node
#[async_trait]
pub trait StorageNode: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// Nonce of the next transaction from `address`, pending pool included
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    /// Hands a signed EIP-2718 transaction to the node.
    ///
    /// A JSON-RPC error response maps to
    /// [`StorageClientError::SubmissionRejected`], transport failures to
    /// [`StorageClientError::Connection`].
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash>;

    /// Receipt of `tx_hash`, `None` while the transaction is not yet mined
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>>;

    /// Entities matching a query expression such as `foo = "bar"`
    async fn query_entities(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Node client over an alloy HTTP provider
///
/// The provider is owned by this value and released when it is dropped.
#[derive(Clone)]
pub struct AlloyNode {
    provider: DynProvider,
    url: Url,
}

impl AlloyNode {
    /// Creates a client for the node at `node_url`
    ///
    /// No request is made until the first call.
    pub fn connect(node_url: &str) -> Result<Self> {
        let url: Url = node_url.parse().map_err(|e| {
            StorageClientError::Configuration(format!("Invalid node URL '{}': {}", node_url, e))
        })?;

        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
        debug!("Created node client for {}", url);

        Ok(Self { provider, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Balance of `address` in wei
    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address).await.map_err(read_error)
    }
}

#[async_trait]
impl StorageNode for AlloyNode {
    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.map_err(read_error)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(read_error)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        match self.provider.send_raw_transaction(raw).await {
            Ok(pending) => Ok(*pending.tx_hash()),
            Err(RpcError::ErrorResp(payload)) => Err(StorageClientError::SubmissionRejected {
                message: payload.message.to_string(),
            }),
            Err(e) => Err(StorageClientError::Connection(e.to_string())),
        }
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(read_error)?;
        Ok(receipt.map(Receipt::from))
    }

    async fn query_entities(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.provider
            .raw_request::<_, Vec<SearchResult>>(QUERY_ENTITIES_METHOD.into(), (query.to_string(),))
            .await
            .map_err(read_error)
    }
}

fn read_error(e: TransportError) -> StorageClientError {
    match e {
        RpcError::ErrorResp(payload) => {
            StorageClientError::Rpc(format!("{} (code {})", payload.message, payload.code))
        }
        other => StorageClientError::Connection(other.to_string()),
    }
}
