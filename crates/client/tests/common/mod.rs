//! In-memory Golem Base node used by the pipeline tests
//!
//! Decodes the signed envelope, applies the storage transaction atomically
//! and emits the same entity logs as the storage processor.

#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, Log, TxHash, TxKind};
use async_trait::async_trait;
use golembase_client::{
    Receipt, Result, STORAGE_PROCESSOR_ADDRESS, SearchResult, StorageClientError, StorageNode,
};
use golembase_storagetx::{
    EntityEvent, EntityKey, NumericAnnotation, StorageTransaction, StringAnnotation,
    derive_created_keys,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub const CHAIN_ID: u64 = 1337;

// First development account of anvil/hardhat
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// How the node treats submitted transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Mine every valid transaction
    Mine,
    /// Accept transactions but never produce a receipt
    NeverMine,
    /// Refuse every raw transaction with this message
    Reject(String),
    /// Mine, but emit receipts without logs
    DropLogs,
    /// Never answer a raw transaction
    StallSend,
    /// Accept and mine, then drop the connection before answering
    ResetAfterAccept,
}

#[derive(Debug, Clone)]
pub struct StoredEntity {
    pub payload: Bytes,
    pub expires_at_block: u64,
    pub string_annotations: Vec<StringAnnotation>,
    pub numeric_annotations: Vec<NumericAnnotation>,
}

#[derive(Debug, Default)]
struct State {
    entities: BTreeMap<EntityKey, StoredEntity>,
    receipts: HashMap<TxHash, Receipt>,
    sent: Vec<TxHash>,
    next_nonce: u64,
    block: u64,
    receipt_lookups: usize,
    pending_polls: usize,
    failing_lookups: usize,
}

pub struct MemoryNode {
    behavior: Behavior,
    state: Mutex<State>,
}

impl MemoryNode {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            state: Mutex::new(State {
                block: 100,
                ..Default::default()
            }),
        }
    }

    /// Report the transaction as pending for the first `polls` lookups
    pub fn with_pending_polls(self, polls: usize) -> Self {
        self.state.lock().unwrap().pending_polls = polls;
        self
    }

    /// Fail the first `lookups` receipt lookups with a connection error
    pub fn with_failing_lookups(self, lookups: usize) -> Self {
        self.state.lock().unwrap().failing_lookups = lookups;
        self
    }

    pub fn sent(&self) -> Vec<TxHash> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn entity(&self, key: &EntityKey) -> Option<StoredEntity> {
        self.state.lock().unwrap().entities.get(key).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.state.lock().unwrap().entities.len()
    }

    pub fn receipt_lookups(&self) -> usize {
        self.state.lock().unwrap().receipt_lookups
    }

    fn processor() -> Address {
        STORAGE_PROCESSOR_ADDRESS.parse().unwrap()
    }
}

/// Applies `tx` to a copy of `entities`; the copy replaces the original only
/// when every operation succeeds.
fn apply(
    entities: &BTreeMap<EntityKey, StoredEntity>,
    tx: &StorageTransaction,
    tx_hash: TxHash,
    block: u64,
) -> Option<(BTreeMap<EntityKey, StoredEntity>, Vec<EntityEvent>)> {
    let mut next = entities.clone();
    let mut events = Vec::new();

    for (create, key) in tx.create.iter().zip(derive_created_keys(tx_hash, tx)) {
        let expires_at_block = block + create.ttl;
        next.insert(
            key,
            StoredEntity {
                payload: create.payload.clone(),
                expires_at_block,
                string_annotations: create.string_annotations.clone(),
                numeric_annotations: create.numeric_annotations.clone(),
            },
        );
        events.push(EntityEvent::Created {
            entity_key: key,
            expires_at_block,
        });
    }

    for update in &tx.update {
        let entity = next.get_mut(&update.entity_key)?;
        entity.payload = update.payload.clone();
        entity.expires_at_block = block + update.ttl;
        entity.string_annotations = update.string_annotations.clone();
        entity.numeric_annotations = update.numeric_annotations.clone();
        events.push(EntityEvent::Updated {
            entity_key: update.entity_key,
            expires_at_block: entity.expires_at_block,
        });
    }

    for key in &tx.delete {
        next.remove(key)?;
        events.push(EntityEvent::Deleted { entity_key: *key });
    }

    Some((next, events))
}

fn matches_query(entity: &StoredEntity, query: &str) -> bool {
    let Some((key, value)) = query.split_once('=') else {
        return false;
    };
    let (key, value) = (key.trim(), value.trim());

    if let Some(text) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        entity
            .string_annotations
            .iter()
            .any(|a| a.key == key && a.value == text)
    } else if let Ok(number) = value.parse::<u64>() {
        entity
            .numeric_annotations
            .iter()
            .any(|a| a.key == key && a.value == number)
    } else {
        false
    }
}

#[async_trait]
impl StorageNode for MemoryNode {
    async fn chain_id(&self) -> Result<u64> {
        Ok(CHAIN_ID)
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64> {
        Ok(self.state.lock().unwrap().next_nonce)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        match &self.behavior {
            Behavior::Reject(message) => {
                return Err(StorageClientError::SubmissionRejected {
                    message: message.clone(),
                });
            }
            Behavior::StallSend => std::future::pending::<()>().await,
            _ => {}
        }

        let rejected = |message: &str| StorageClientError::SubmissionRejected {
            message: message.to_string(),
        };

        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| rejected(&format!("rlp: {}", e)))?;
        let TxEnvelope::Eip1559(signed) = envelope else {
            return Err(rejected("transaction type not supported"));
        };
        let tx_hash = *signed.hash();
        let tx = signed.tx();

        if tx.chain_id != CHAIN_ID {
            return Err(rejected("invalid chain id for signer"));
        }
        if tx.to != TxKind::Call(Self::processor()) {
            return Err(rejected("not a storage transaction"));
        }

        let mut state = self.state.lock().unwrap();
        if tx.nonce != state.next_nonce {
            return Err(rejected("nonce too low"));
        }
        state.next_nonce += 1;
        state.sent.push(tx_hash);

        if self.behavior == Behavior::NeverMine {
            return Ok(tx_hash);
        }

        state.block += 1;
        let block = state.block;

        // Undecodable payloads fail on chain, like any other processing error
        let applied = StorageTransaction::decode(&tx.input)
            .ok()
            .and_then(|storage_tx| apply(&state.entities, &storage_tx, tx_hash, block));

        let (success, events) = match applied {
            Some((entities, events)) => {
                state.entities = entities;
                (true, events)
            }
            None => (false, Vec::new()),
        };

        let logs = if self.behavior == Behavior::DropLogs {
            Vec::new()
        } else {
            events
                .iter()
                .map(|event| Log {
                    address: Self::processor(),
                    data: event.to_log_data(),
                })
                .collect()
        };

        state.receipts.insert(
            tx_hash,
            Receipt {
                transaction_hash: tx_hash,
                block_number: Some(block),
                success,
                logs,
            },
        );

        if self.behavior == Behavior::ResetAfterAccept {
            return Err(StorageClientError::Connection(
                "connection reset by peer".to_string(),
            ));
        }

        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>> {
        let mut state = self.state.lock().unwrap();
        state.receipt_lookups += 1;

        if state.failing_lookups > 0 {
            state.failing_lookups -= 1;
            return Err(StorageClientError::Connection("connection reset".to_string()));
        }
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(None);
        }

        Ok(state.receipts.get(&tx_hash).cloned())
    }

    async fn query_entities(&self, query: &str) -> Result<Vec<SearchResult>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entities
            .iter()
            .filter(|(_, entity)| matches_query(entity, query))
            .map(|(key, entity)| SearchResult {
                key: *key,
                value: entity.payload.clone(),
            })
            .collect())
    }
}
