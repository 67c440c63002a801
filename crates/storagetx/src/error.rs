//! Error types for the storage transaction model

use std::fmt;
use thiserror::Error;

/// Result type alias for storage transaction operations
pub type Result<T> = std::result::Result<T, StorageTxError>;

/// Position of an operation inside a storage transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationRef {
    Create(usize),
    Update(usize),
    Delete(usize),
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(i) => write!(f, "create[{}]", i),
            Self::Update(i) => write!(f, "update[{}]", i),
            Self::Delete(i) => write!(f, "delete[{}]", i),
        }
    }
}

/// Value type of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    String,
    Numeric,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Numeric => f.write_str("numeric"),
        }
    }
}

/// Errors raised while validating, encoding or decoding storage transactions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageTxError {
    /// Two annotations of the same type share a key within one operation
    #[error("Duplicate {kind} annotation key '{key}' in {operation}")]
    DuplicateAnnotation {
        operation: OperationRef,
        kind: AnnotationKind,
        key: String,
    },

    /// Update or delete targets the zero entity key
    #[error("Zero entity key in {0}")]
    ZeroEntityKey(OperationRef),

    /// RLP payload is truncated or malformed
    #[error("RLP decode error: {0}")]
    Decode(#[from] alloy_rlp::Error),

    /// Input continues after a complete storage transaction
    #[error("{0} trailing bytes after storage transaction")]
    TrailingBytes(usize),

    /// A log carries a known entity event topic but cannot be decoded
    #[error("Malformed {event} log: {reason}")]
    MalformedLog { event: &'static str, reason: String },
}
