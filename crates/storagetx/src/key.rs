//! Entity key derivation
//!
//! The key of a created entity is `keccak256(tx_hash || payload || index)`,
//! with `index` the position of the create within its transaction encoded as a
//! 32-byte big-endian word. Binding the key to the transaction hash and the
//! index keeps keys unique across transactions and across identical payloads
//! within one transaction.

use alloy::primitives::{B256, Keccak256, U256};

use crate::transaction::StorageTransaction;

/// Derives the key of the create at `index` in the transaction `tx_hash`.
pub fn entity_key(tx_hash: B256, payload: &[u8], index: usize) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(tx_hash);
    hasher.update(payload);
    hasher.update(U256::from(index).to_be_bytes::<32>());
    hasher.finalize()
}

/// Derives the keys of every create in `tx`, in create order.
pub fn derive_created_keys(tx_hash: B256, tx: &StorageTransaction) -> Vec<B256> {
    tx.create
        .iter()
        .enumerate()
        .map(|(i, create)| entity_key(tx_hash, &create.payload, i))
        .collect()
}
