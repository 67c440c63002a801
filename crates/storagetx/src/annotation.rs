//! Annotations attached to entities for indexing and queries

use alloy_rlp::{RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{AnnotationKind, OperationRef, Result, StorageTxError};

/// String-valued annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct StringAnnotation {
    pub key: String,
    pub value: String,
}

impl StringAnnotation {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Numeric annotation, value is an unsigned 64-bit integer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct NumericAnnotation {
    pub key: String,
    pub value: u64,
}

impl NumericAnnotation {
    pub fn new(key: impl Into<String>, value: u64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Rejects a repeated key among annotations of one type.
///
/// A string and a numeric annotation may share a key, so each type is
/// checked separately.
pub(crate) fn check_unique_keys(
    operation: OperationRef,
    strings: &[StringAnnotation],
    numerics: &[NumericAnnotation],
) -> Result<()> {
    if let Some(key) = first_duplicate(strings.iter().map(|a| a.key.as_str())) {
        return Err(StorageTxError::DuplicateAnnotation {
            operation,
            kind: AnnotationKind::String,
            key: key.to_string(),
        });
    }

    if let Some(key) = first_duplicate(numerics.iter().map(|a| a.key.as_str())) {
        return Err(StorageTxError::DuplicateAnnotation {
            operation,
            kind: AnnotationKind::Numeric,
            key: key.to_string(),
        });
    }

    Ok(())
}

fn first_duplicate<'a>(mut keys: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    keys.find(|key| !seen.insert(*key))
}
