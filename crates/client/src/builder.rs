//! Storage transaction envelope builder and signer
//!
//! Wraps an encoded storage transaction into an EIP-1559 envelope addressed
//! to the storage processor and signs it. Building and signing perform no
//! I/O; chain id and nonce are supplied by the caller.

use alloy::consensus::{SignableTransaction, Signed, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, Signature, TxHash, TxKind, U256, address};

use crate::account::AccountProvider;
use crate::error::Result;

/// Fixed parameters of every storage transaction envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPolicy {
    /// Destination address
    pub storage_processor: Address,
    pub gas_limit: u64,
    /// Tip cap in wei
    pub max_priority_fee_per_gas: u128,
    /// Fee cap in wei
    pub max_fee_per_gas: u128,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            storage_processor: address!("0x0000000000000000000000000000000060138453"),
            gas_limit: 1_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            max_fee_per_gas: 5_000_000_000,
        }
    }
}

/// Builds and signs storage transaction envelopes under a fixed policy
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    policy: TransactionPolicy,
}

impl TransactionBuilder {
    pub fn new(policy: TransactionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TransactionPolicy {
        &self.policy
    }

    /// Unsigned envelope carrying `payload` as call data
    pub fn build(&self, chain_id: u64, nonce: u64, payload: Bytes) -> TxEip1559 {
        TxEip1559 {
            chain_id,
            nonce,
            gas_limit: self.policy.gas_limit,
            max_fee_per_gas: self.policy.max_fee_per_gas,
            max_priority_fee_per_gas: self.policy.max_priority_fee_per_gas,
            to: TxKind::Call(self.policy.storage_processor),
            value: U256::ZERO,
            input: payload,
            ..Default::default()
        }
    }

    pub fn sign<A>(&self, mut tx: TxEip1559, account: &A) -> Result<SignedStorageTransaction>
    where
        A: AccountProvider + ?Sized,
    {
        let signature = account.sign_transaction(&mut tx)?;
        Ok(SignedStorageTransaction {
            inner: tx.into_signed(signature),
        })
    }
}

/// Signed envelope, immutable once created
#[derive(Debug, Clone)]
pub struct SignedStorageTransaction {
    inner: Signed<TxEip1559>,
}

impl SignedStorageTransaction {
    /// Hash the node will report in the receipt
    pub fn hash(&self) -> TxHash {
        *self.inner.hash()
    }

    pub fn tx(&self) -> &TxEip1559 {
        self.inner.tx()
    }

    pub fn signature(&self) -> &Signature {
        self.inner.signature()
    }

    /// EIP-2718 encoding for `eth_sendRawTransaction`
    pub fn encoded_2718(&self) -> Vec<u8> {
        TxEnvelope::from(self.inner.clone()).encoded_2718()
    }
}
