//! Submission and confirmation pipeline
//!
//! A storage transaction moves through these stages:
//!
//! | stage     | method                              | failure                                   |
//! |-----------|-------------------------------------|-------------------------------------------|
//! | Built     | [`Submitter::prepare`]              | malformed, connection, signing, cancelled |
//! | Sent      | [`Submitter::send`]                 | rejected, cancelled, indeterminate        |
//! | Pending   | [`Submitter::wait_for_receipt`]     | indeterminate (cancelled or timed out)    |
//! | Mined     | [`confirm`]                         | transaction failed, incomplete logs       |
//!
//! [`Submitter::submit`] runs all stages. Nothing is retried: once the
//! transaction has been sent, every error carries its hash so the caller can
//! reconcile it against the chain.

use alloy::primitives::{Address, TxHash};
use golembase_storagetx::{
    EntityEvent, EntityEventKind, EntityKey, StorageTransaction, derive_created_keys,
};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::account::AccountProvider;
use crate::builder::{SignedStorageTransaction, TransactionBuilder};
use crate::config::ClientConfig;
use crate::error::{Result, StorageClientError};
use crate::node::{Receipt, StorageNode};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Outcome of a mined and fully accounted storage transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// Entity events in log order
    pub events: Vec<EntityEvent>,
}

impl Confirmation {
    /// Keys of created entities, in create order
    pub fn created_keys(&self) -> Vec<EntityKey> {
        self.keys_of(EntityEventKind::Created)
    }

    pub fn updated_keys(&self) -> Vec<EntityKey> {
        self.keys_of(EntityEventKind::Updated)
    }

    pub fn deleted_keys(&self) -> Vec<EntityKey> {
        self.keys_of(EntityEventKind::Deleted)
    }

    fn keys_of(&self, kind: EntityEventKind) -> Vec<EntityKey> {
        self.events
            .iter()
            .filter(|event| event.kind() == kind)
            .map(EntityEvent::entity_key)
            .collect()
    }
}

/// Signs storage transactions for one account and drives them to a confirmed
/// outcome on one node
///
/// Assumes a single in-flight transaction per account; the nonce is read from
/// the node's pending pool right before signing.
pub struct Submitter<N, A> {
    node: N,
    account: A,
    builder: TransactionBuilder,
    expected_chain_id: Option<u64>,
    poll_interval: Duration,
    confirmation_timeout: Option<Duration>,
}

impl<N, A> Submitter<N, A>
where
    N: StorageNode,
    A: AccountProvider,
{
    pub fn new(node: N, account: A, builder: TransactionBuilder) -> Self {
        Self {
            node,
            account,
            builder,
            expected_chain_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: None,
        }
    }

    pub fn from_config(node: N, account: A, config: &ClientConfig) -> Result<Self> {
        config
            .validate()
            .map_err(StorageClientError::Configuration)?;

        Ok(Self::new(node, account, TransactionBuilder::new(config.transaction_policy()?))
            .with_expected_chain_id(config.chain_id)
            .with_poll_interval(config.poll_interval())
            .with_confirmation_timeout(config.confirmation_timeout()))
    }

    /// Refuse to sign when the node reports another chain
    pub fn with_expected_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.expected_chain_id = chain_id;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Report the outcome as indeterminate when no receipt shows up in time
    pub fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    /// Runs every stage and returns the confirmed outcome
    pub async fn submit(
        &self,
        tx: &StorageTransaction,
        cancel: &CancellationToken,
    ) -> Result<Confirmation> {
        let signed = self.prepare(tx, cancel).await?;
        let tx_hash = self.send(&signed, cancel).await?;
        let receipt = self.wait_for_receipt(tx_hash, cancel).await?;
        confirm(tx, receipt, self.builder.policy().storage_processor)
    }

    /// Encodes `tx` and signs it with the current chain id and pending nonce
    pub async fn prepare(
        &self,
        tx: &StorageTransaction,
        cancel: &CancellationToken,
    ) -> Result<SignedStorageTransaction> {
        let payload = tx.encode().inspect_err(|e| {
            error!("Refusing to submit malformed storage transaction: {}", e);
        })?;

        let context = async {
            let chain_id = self.node.chain_id().await?;
            if let Some(expected) = self.expected_chain_id {
                if chain_id != expected {
                    return Err(StorageClientError::Configuration(format!(
                        "Node reports chain {}, expected {}",
                        chain_id, expected
                    )));
                }
            }
            let nonce = self.node.pending_nonce(self.account.address()).await?;
            Ok::<_, StorageClientError>((chain_id, nonce))
        };

        let (chain_id, nonce) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageClientError::Cancelled),
            context = context => context?,
        };

        let signed = self
            .builder
            .sign(self.builder.build(chain_id, nonce, payload), &self.account)?;

        debug!(
            "Built storage transaction {} on chain {} with nonce {} ({} creates, {} updates, {} deletes)",
            signed.hash(),
            chain_id,
            nonce,
            tx.create.len(),
            tx.update.len(),
            tx.delete.len()
        );

        Ok(signed)
    }

    /// Hands the signed envelope to the node; no retry.
    ///
    /// A rejection by the node means nothing was accepted. Cancellation and
    /// transport failures once the request is under way leave the outcome
    /// open and are reported as [`StorageClientError::Indeterminate`].
    pub async fn send(
        &self,
        signed: &SignedStorageTransaction,
        cancel: &CancellationToken,
    ) -> Result<TxHash> {
        let tx_hash = signed.hash();

        if cancel.is_cancelled() {
            return Err(StorageClientError::Cancelled);
        }

        let raw = signed.encoded_2718();
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Cancelled while sending transaction {}, outcome unknown", tx_hash);
                return Err(StorageClientError::Indeterminate {
                    tx_hash,
                    reason: "cancelled while sending".to_string(),
                });
            }
            sent = self.node.send_raw_transaction(&raw) => sent,
        };

        let reported = match sent {
            Ok(reported) => reported,
            Err(e @ StorageClientError::SubmissionRejected { .. }) => {
                error!("Node rejected transaction {}: {}", tx_hash, e);
                return Err(e);
            }
            Err(e) => {
                warn!("Sending transaction {} failed, outcome unknown: {}", tx_hash, e);
                return Err(StorageClientError::Indeterminate {
                    tx_hash,
                    reason: format!("send failed: {}", e),
                });
            }
        };

        if reported != tx_hash {
            warn!(
                "Node reported hash {} for transaction {}, tracking the local hash",
                reported, tx_hash
            );
        }

        info!("Sent storage transaction {}", tx_hash);
        Ok(tx_hash)
    }

    /// Waits until the node has a receipt for `tx_hash`.
    ///
    /// Cancellation and the confirmation timeout end the wait with
    /// [`StorageClientError::Indeterminate`]. Failed receipt lookups are
    /// logged and retried at the poll interval.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        cancel: &CancellationToken,
    ) -> Result<Receipt> {
        let timeout = async {
            match self.confirmation_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Stopped waiting for transaction {}, outcome unknown", tx_hash);
                Err(StorageClientError::Indeterminate {
                    tx_hash,
                    reason: "wait for receipt cancelled".to_string(),
                })
            }
            _ = timeout => {
                warn!("Timed out waiting for transaction {}, outcome unknown", tx_hash);
                Err(StorageClientError::Indeterminate {
                    tx_hash,
                    reason: format!(
                        "no receipt after {:?}",
                        self.confirmation_timeout.unwrap_or_default()
                    ),
                })
            }
            receipt = self.poll_receipt(tx_hash) => Ok(receipt),
        }
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> Receipt {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.node.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => debug!("Transaction {} still pending", tx_hash),
                Err(e) => warn!("Receipt lookup for {} failed: {}", tx_hash, e),
            }
        }
    }
}

/// Turns the receipt of `tx` into its confirmed outcome.
///
/// A failed receipt means nothing was applied. A successful receipt must
/// carry one entity event from `storage_processor` per operation; missing or
/// surplus events are reported as
/// [`StorageClientError::IncompleteConfirmation`]. Logs emitted by other
/// addresses are ignored.
pub fn confirm(
    tx: &StorageTransaction,
    receipt: Receipt,
    storage_processor: Address,
) -> Result<Confirmation> {
    let tx_hash = receipt.transaction_hash;

    if !receipt.success {
        error!(
            "Storage transaction {} failed in block {:?}",
            tx_hash, receipt.block_number
        );
        return Err(StorageClientError::TransactionFailed {
            tx_hash,
            block_number: receipt.block_number,
        });
    }

    let incomplete = |detail: String| StorageClientError::IncompleteConfirmation { tx_hash, detail };

    let mut events = Vec::with_capacity(receipt.logs.len());
    for log in receipt.logs.iter().filter(|log| log.address == storage_processor) {
        if let Some(event) = EntityEvent::from_log_data(&log.data).map_err(|e| incomplete(e.to_string()))? {
            events.push(event);
        }
    }

    let confirmation = Confirmation {
        transaction_hash: tx_hash,
        block_number: receipt.block_number,
        events,
    };

    let created = confirmation.created_keys();
    if created.len() != tx.create.len() {
        return Err(incomplete(format!(
            "expected {} EntityCreated logs, found {}",
            tx.create.len(),
            created.len()
        )));
    }

    check_keys(
        EntityEventKind::Updated,
        tx.update.iter().map(|update| update.entity_key).collect(),
        confirmation.updated_keys(),
    )
    .map_err(incomplete)?;

    check_keys(
        EntityEventKind::Deleted,
        tx.delete.clone(),
        confirmation.deleted_keys(),
    )
    .map_err(incomplete)?;

    if created != derive_created_keys(tx_hash, tx) {
        debug!(
            "Created keys of {} differ from locally derived keys, using the logged keys",
            tx_hash
        );
    }

    info!(
        "Storage transaction {} confirmed in block {:?}: {} created, {} updated, {} deleted",
        tx_hash,
        confirmation.block_number,
        created.len(),
        tx.update.len(),
        tx.delete.len()
    );

    Ok(confirmation)
}

/// Every requested key needs its own log, so keys are compared as multisets
fn check_keys(
    kind: EntityEventKind,
    mut requested: Vec<EntityKey>,
    mut observed: Vec<EntityKey>,
) -> std::result::Result<(), String> {
    if requested.len() != observed.len() {
        return Err(format!(
            "expected {} {} logs, found {}",
            requested.len(),
            kind.name(),
            observed.len()
        ));
    }

    requested.sort_unstable();
    observed.sort_unstable();
    if requested == observed {
        return Ok(());
    }

    let occurrences = |keys: &[EntityKey], key: &EntityKey| keys.iter().filter(|k| *k == key).count();
    match requested
        .iter()
        .find(|key| occurrences(&requested, key) > occurrences(&observed, key))
    {
        Some(key) => Err(format!("no {} log for entity {}", kind.name(), key)),
        None => Err(format!("{} logs do not match the requested entities", kind.name())),
    }
}
