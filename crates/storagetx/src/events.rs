//! Entity events emitted by the storage processor
//!
//! Every applied operation emits one log. The first topic is the event
//! signature hash, the second topic is the entity key. Created and updated
//! events carry the expiration block as their only data word.

use alloy::primitives::{B256, LogData, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use crate::error::{Result, StorageTxError};

sol! {
    #[derive(Debug)]
    event GolemBaseStorageEntityCreated(uint256 indexed entityKey, uint256 expirationBlock);

    #[derive(Debug)]
    event GolemBaseStorageEntityUpdated(uint256 indexed entityKey, uint256 expirationBlock);

    #[derive(Debug)]
    event GolemBaseStorageEntityDeleted(uint256 indexed entityKey);
}

/// Topic of entity creation logs
pub const ENTITY_CREATED_TOPIC: B256 = GolemBaseStorageEntityCreated::SIGNATURE_HASH;

/// Topic of entity update logs
pub const ENTITY_UPDATED_TOPIC: B256 = GolemBaseStorageEntityUpdated::SIGNATURE_HASH;

/// Topic of entity deletion logs
pub const ENTITY_DELETED_TOPIC: B256 = GolemBaseStorageEntityDeleted::SIGNATURE_HASH;

/// Entity event kinds known to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityEventKind {
    Created,
    Updated,
    Deleted,
}

impl EntityEventKind {
    pub fn from_topic(topic: &B256) -> Option<Self> {
        [Self::Created, Self::Updated, Self::Deleted]
            .into_iter()
            .find(|kind| kind.topic() == *topic)
    }

    pub fn topic(&self) -> B256 {
        match self {
            Self::Created => ENTITY_CREATED_TOPIC,
            Self::Updated => ENTITY_UPDATED_TOPIC,
            Self::Deleted => ENTITY_DELETED_TOPIC,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "EntityCreated",
            Self::Updated => "EntityUpdated",
            Self::Deleted => "EntityDeleted",
        }
    }
}

/// Decoded entity event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    Created { entity_key: B256, expires_at_block: u64 },
    Updated { entity_key: B256, expires_at_block: u64 },
    Deleted { entity_key: B256 },
}

impl EntityEvent {
    pub fn kind(&self) -> EntityEventKind {
        match self {
            Self::Created { .. } => EntityEventKind::Created,
            Self::Updated { .. } => EntityEventKind::Updated,
            Self::Deleted { .. } => EntityEventKind::Deleted,
        }
    }

    pub fn entity_key(&self) -> B256 {
        match self {
            Self::Created { entity_key, .. }
            | Self::Updated { entity_key, .. }
            | Self::Deleted { entity_key } => *entity_key,
        }
    }

    /// Decodes a log into an entity event.
    ///
    /// Returns `Ok(None)` for logs whose first topic is not an entity event
    /// signature, and an error for entity event logs that cannot be decoded.
    pub fn from_log_data(log: &LogData) -> Result<Option<Self>> {
        let Some(kind) = log.topics().first().and_then(EntityEventKind::from_topic) else {
            return Ok(None);
        };

        let malformed = |e: alloy::sol_types::Error| StorageTxError::MalformedLog {
            event: kind.name(),
            reason: e.to_string(),
        };

        let event = match kind {
            EntityEventKind::Created => {
                let decoded = GolemBaseStorageEntityCreated::decode_log_data(log).map_err(malformed)?;
                Self::Created {
                    entity_key: decoded.entityKey.into(),
                    expires_at_block: decoded.expirationBlock.saturating_to(),
                }
            }
            EntityEventKind::Updated => {
                let decoded = GolemBaseStorageEntityUpdated::decode_log_data(log).map_err(malformed)?;
                Self::Updated {
                    entity_key: decoded.entityKey.into(),
                    expires_at_block: decoded.expirationBlock.saturating_to(),
                }
            }
            EntityEventKind::Deleted => {
                let decoded = GolemBaseStorageEntityDeleted::decode_log_data(log).map_err(malformed)?;
                Self::Deleted {
                    entity_key: decoded.entityKey.into(),
                }
            }
        };

        Ok(Some(event))
    }

    /// Encodes the event as the storage processor emits it.
    pub fn to_log_data(&self) -> LogData {
        match *self {
            Self::Created {
                entity_key,
                expires_at_block,
            } => GolemBaseStorageEntityCreated {
                entityKey: entity_key.into(),
                expirationBlock: U256::from(expires_at_block),
            }
            .encode_log_data(),
            Self::Updated {
                entity_key,
                expires_at_block,
            } => GolemBaseStorageEntityUpdated {
                entityKey: entity_key.into(),
                expirationBlock: U256::from(expires_at_block),
            }
            .encode_log_data(),
            Self::Deleted { entity_key } => GolemBaseStorageEntityDeleted {
                entityKey: entity_key.into(),
            }
            .encode_log_data(),
        }
    }
}
