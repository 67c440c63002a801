//! Storage transaction model and its canonical RLP encoding
//!
//! A [`StorageTransaction`] batches create, update and delete operations that
//! the storage processor applies atomically: either every operation succeeds
//! or none is applied.
//!
//! - **Create** adds a new entity with a TTL (in blocks), a payload and
//!   annotations. Its key is derived from the payload, the hash of the
//!   enclosing ledger transaction and the index of the create (see
//!   [`crate::key`]).
//! - **Update** replaces TTL, payload and annotations of an existing entity.
//!   A missing entity fails the whole transaction.
//! - **Delete** removes an existing entity. A missing entity fails the whole
//!   transaction.
//!
//! The encoding is the bit-exact wire contract: a list of three lists
//! (creates, updates, deletes), each operation a list of its fields in
//! declaration order.

use alloy::primitives::{B256, Bytes};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

use crate::annotation::{NumericAnnotation, StringAnnotation, check_unique_keys};
use crate::error::{OperationRef, Result, StorageTxError};

/// Creates a new entity
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable,
)]
#[serde(rename_all = "camelCase")]
pub struct Create {
    /// Number of blocks the entity stays valid
    pub ttl: u64,
    pub payload: Bytes,
    pub string_annotations: Vec<StringAnnotation>,
    pub numeric_annotations: Vec<NumericAnnotation>,
}

impl Create {
    pub fn new(ttl: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            ttl,
            payload: payload.into(),
            ..Default::default()
        }
    }

    pub fn with_string_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_annotations.push(StringAnnotation::new(key, value));
        self
    }

    pub fn with_numeric_annotation(mut self, key: impl Into<String>, value: u64) -> Self {
        self.numeric_annotations.push(NumericAnnotation::new(key, value));
        self
    }
}

/// Replaces an existing entity
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable,
)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub entity_key: B256,
    pub ttl: u64,
    pub payload: Bytes,
    pub string_annotations: Vec<StringAnnotation>,
    pub numeric_annotations: Vec<NumericAnnotation>,
}

impl Update {
    pub fn new(entity_key: B256, ttl: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            entity_key,
            ttl,
            payload: payload.into(),
            ..Default::default()
        }
    }

    pub fn with_string_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_annotations.push(StringAnnotation::new(key, value));
        self
    }

    pub fn with_numeric_annotation(mut self, key: impl Into<String>, value: u64) -> Self {
        self.numeric_annotations.push(NumericAnnotation::new(key, value));
        self
    }
}

/// Batch of storage operations applied atomically by the storage processor
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable,
)]
pub struct StorageTransaction {
    pub create: Vec<Create>,
    pub update: Vec<Update>,
    /// Keys of the entities to delete
    pub delete: Vec<B256>,
}

impl StorageTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create(mut self, create: Create) -> Self {
        self.create.push(create);
        self
    }

    pub fn with_update(mut self, update: Update) -> Self {
        self.update.push(update);
        self
    }

    pub fn with_delete(mut self, entity_key: B256) -> Self {
        self.delete.push(entity_key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    /// Checks the structural invariants that do not need remote state.
    ///
    /// Entity existence for updates and deletes is only known to the remote
    /// node and surfaces as a failed receipt.
    pub fn validate(&self) -> Result<()> {
        for (i, create) in self.create.iter().enumerate() {
            check_unique_keys(
                OperationRef::Create(i),
                &create.string_annotations,
                &create.numeric_annotations,
            )?;
        }

        for (i, update) in self.update.iter().enumerate() {
            let operation = OperationRef::Update(i);
            if update.entity_key.is_zero() {
                return Err(StorageTxError::ZeroEntityKey(operation));
            }
            check_unique_keys(
                operation,
                &update.string_annotations,
                &update.numeric_annotations,
            )?;
        }

        for (i, key) in self.delete.iter().enumerate() {
            if key.is_zero() {
                return Err(StorageTxError::ZeroEntityKey(OperationRef::Delete(i)));
            }
        }

        Ok(())
    }

    /// Validates and RLP-encodes the transaction.
    ///
    /// Identical transactions always produce identical bytes.
    pub fn encode(&self) -> Result<Bytes> {
        self.validate()?;
        let mut out = Vec::with_capacity(self.length());
        Encodable::encode(self, &mut out);
        Ok(out.into())
    }

    /// Decodes a transaction from its RLP encoding.
    ///
    /// Truncated, malformed or over-long input is rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        let tx = <Self as Decodable>::decode(&mut buf)?;
        if !buf.is_empty() {
            return Err(StorageTxError::TrailingBytes(buf.len()));
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;

    const KEY_A: B256 = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    fn hello_tx() -> StorageTransaction {
        StorageTransaction::new()
            .with_create(Create::new(100, &b"hello"[..]).with_string_annotation("foo", "bar"))
    }

    #[test]
    fn test_encode_matches_reference_bytes() {
        let encoded = hello_tx().encode().unwrap();
        assert_eq!(
            hex::encode(&encoded),
            "d6d3d2648568656c6c6fc9c883666f6f83626172c0c0c0"
        );
    }

    #[test]
    fn test_empty_transaction_encoding() {
        let encoded = StorageTransaction::new().encode().unwrap();
        assert_eq!(hex::encode(&encoded), "c3c0c0c0");
        assert!(StorageTransaction::new().is_empty());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let tx = hello_tx()
            .with_update(Update::new(KEY_A, 7, &b"v2"[..]).with_numeric_annotation("n", 9))
            .with_delete(KEY_A);

        assert_eq!(tx.encode().unwrap(), tx.encode().unwrap());
        assert_eq!(tx.encode().unwrap(), tx.clone().encode().unwrap());
    }

    #[test]
    fn test_decode_inverts_encode() {
        let tx = hello_tx()
            .with_create(
                Create::new(0, Bytes::new())
                    .with_numeric_annotation("size", u64::MAX)
                    .with_string_annotation("size", ""),
            )
            .with_update(Update::new(KEY_A, 1, &b"payload"[..]).with_string_annotation("k", "v"))
            .with_delete(KEY_A);

        let decoded = StorageTransaction::decode(&tx.encode().unwrap()).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_operation_order_is_preserved() {
        let tx = StorageTransaction::new()
            .with_create(Create::new(1, &b"first"[..]))
            .with_create(Create::new(2, &b"second"[..]));
        let swapped = StorageTransaction::new()
            .with_create(Create::new(2, &b"second"[..]))
            .with_create(Create::new(1, &b"first"[..]));

        assert_ne!(tx.encode().unwrap(), swapped.encode().unwrap());
        let decoded = StorageTransaction::decode(&tx.encode().unwrap()).unwrap();
        assert_eq!(decoded.create[0].payload.as_ref(), b"first");
        assert_eq!(decoded.create[1].payload.as_ref(), b"second");
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let encoded = hello_tx().encode().unwrap();
        for len in 0..encoded.len() {
            assert!(
                StorageTransaction::decode(&encoded[..len]).is_err(),
                "prefix of length {} decoded",
                len
            );
        }
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut encoded = hello_tx().encode().unwrap().to_vec();
        encoded.push(0x80);

        assert_eq!(
            StorageTransaction::decode(&encoded),
            Err(StorageTxError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_decode_rejects_non_list() {
        assert!(StorageTransaction::decode(&[0x83, b'a', b'b', b'c']).is_err());
    }

    #[test]
    fn test_duplicate_annotations_fail_encoding() {
        let tx = StorageTransaction::new().with_create(
            Create::new(1, &b"x"[..])
                .with_string_annotation("foo", "a")
                .with_string_annotation("foo", "b"),
        );
        assert!(matches!(
            tx.encode(),
            Err(StorageTxError::DuplicateAnnotation { .. })
        ));

        let tx = StorageTransaction::new().with_update(
            Update::new(KEY_A, 1, &b"x"[..])
                .with_numeric_annotation("n", 1)
                .with_numeric_annotation("n", 2),
        );
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_string_and_numeric_may_share_key() {
        let tx = StorageTransaction::new().with_create(
            Create::new(1, &b"x"[..])
                .with_string_annotation("foo", "a")
                .with_numeric_annotation("foo", 1),
        );
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn test_zero_keys_rejected() {
        let tx = StorageTransaction::new().with_update(Update::new(B256::ZERO, 1, Bytes::new()));
        assert_eq!(
            tx.validate(),
            Err(StorageTxError::ZeroEntityKey(OperationRef::Update(0)))
        );

        let tx = StorageTransaction::new().with_delete(KEY_A).with_delete(B256::ZERO);
        assert_eq!(
            tx.validate(),
            Err(StorageTxError::ZeroEntityKey(OperationRef::Delete(1)))
        );
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(&hello_tx()).unwrap();
        let create = &json["create"][0];
        assert_eq!(create["ttl"], 100);
        assert_eq!(create["stringAnnotations"][0]["key"], "foo");
        assert!(create["numericAnnotations"].as_array().unwrap().is_empty());
        assert!(json["delete"].as_array().unwrap().is_empty());
    }
}
