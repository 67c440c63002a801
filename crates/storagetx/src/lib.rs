//! Golem Base storage transactions
//!
//! This crate defines what a storage transaction is and how every participant
//! encodes it:
//!
//! - [`annotation`]: string and numeric annotations used for indexing
//! - [`transaction`]: create/update/delete operations, validation and the
//!   canonical RLP encoding
//! - [`key`]: derivation of entity keys for created entities
//! - [`events`]: the entity event logs emitted by the storage processor
//!
//! Nothing here performs I/O. Signing and submission live in
//! `golembase-client`.
//!
//! # Example
//!
//! ```
//! use golembase_storagetx::{Create, StorageTransaction};
//!
//! let tx = StorageTransaction::new()
//!     .with_create(Create::new(100, b"hello".to_vec()).with_string_annotation("foo", "bar"));
//!
//! let encoded = tx.encode().unwrap();
//! assert_eq!(StorageTransaction::decode(&encoded).unwrap(), tx);
//! ```

pub mod annotation;
pub mod error;
pub mod events;
pub mod key;
pub mod transaction;

pub use annotation::{NumericAnnotation, StringAnnotation};
pub use error::{AnnotationKind, OperationRef, Result, StorageTxError};
pub use events::{
    ENTITY_CREATED_TOPIC, ENTITY_DELETED_TOPIC, ENTITY_UPDATED_TOPIC, EntityEvent,
    EntityEventKind,
};
pub use key::{derive_created_keys, entity_key};
pub use transaction::{Create, StorageTransaction, Update};

/// Re-exported so callers can name entity keys without depending on alloy
pub use alloy::primitives::{B256 as EntityKey, Bytes};
