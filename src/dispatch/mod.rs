//! Transaction dispatcher - one transfer per intent, failures become results
//!
//! `dispatch` never returns an error and never touches session or balance
//! state. Refreshing balances after a send is the caller's call.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::TxErrorKind;
use crate::providers::{ChainKind, ChainProviders, EvmTransfer};

/// One user submission. Amount is in base units (wei or satoshi).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub chain: ChainKind,
    pub from: Option<String>,
    pub destination: String,
    pub amount: U256,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TransactionIntent {
    pub fn evm(from: impl Into<String>, destination: impl Into<String>, wei: U256) -> Self {
        Self { chain: ChainKind::Evm, from: Some(from.into()), destination: destination.into(), amount: wei, submitted_at: None }
    }

    pub fn btc(destination: impl Into<String>, sats: u64) -> Self {
        Self { chain: ChainKind::Btc, from: None, destination: destination.into(), amount: U256::from(sats), submitted_at: None }
    }

    /// Stamp the submission time.
    pub fn submit(mut self) -> Self {
        self.submitted_at = Some(Utc::now());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub chain: ChainKind,
    pub success: bool,
    pub tx_hash: Option<String>,
    pub error_kind: Option<TxErrorKind>,
}

impl TransactionResult {
    pub fn succeeded(chain: ChainKind, tx_hash: impl Into<String>) -> Self {
        Self { chain, success: true, tx_hash: Some(tx_hash.into()), error_kind: None }
    }

    pub fn failed(chain: ChainKind, kind: TxErrorKind) -> Self {
        Self { chain, success: false, tx_hash: None, error_kind: Some(kind) }
    }

    /// Failure after a hash was already known (reverted, timed out).
    pub fn failed_with_hash(chain: ChainKind, kind: TxErrorKind, tx_hash: impl Into<String>) -> Self {
        Self { chain, success: false, tx_hash: Some(tx_hash.into()), error_kind: Some(kind) }
    }
}

pub struct TransactionDispatcher {
    providers: ChainProviders,
    confirmations: u64,
    confirmation_timeout: Duration,
}

impl TransactionDispatcher {
    pub fn new(providers: ChainProviders, confirmations: u64, confirmation_timeout: Duration) -> Self {
        Self { providers, confirmations, confirmation_timeout }
    }

    pub async fn dispatch(&self, intent: TransactionIntent) -> TransactionResult {
        let chain = intent.chain;
        if intent.destination.trim().is_empty() {
            warn!(chain = chain.as_str(), "rejecting transaction with empty destination");
            return TransactionResult::failed(chain, TxErrorKind::EmptyDestination);
        }
        let result = match chain {
            ChainKind::Evm => self.dispatch_evm(intent).await,
            ChainKind::Btc => self.dispatch_btc(intent).await,
        };
        match (&result.tx_hash, result.error_kind) {
            (Some(hash), None) => info!(chain = chain.as_str(), tx_hash = %hash, "transaction confirmed"),
            (_, Some(kind)) => warn!(chain = chain.as_str(), error_kind = kind.as_str(), "transaction failed"),
            _ => {}
        }
        result
    }

    async fn dispatch_evm(&self, intent: TransactionIntent) -> TransactionResult {
        let Some(from) = intent.from else {
            return TransactionResult::failed(ChainKind::Evm, TxErrorKind::NotConnected);
        };
        let transfer = EvmTransfer { from, to: intent.destination.trim().to_string(), value: intent.amount, data: Vec::new() };

        let hash = match self.providers.evm.send_transaction(&transfer).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(error = %e, "evm submission failed");
                return TransactionResult::failed(ChainKind::Evm, TxErrorKind::from(&e));
            }
        };

        let wait = self.providers.evm.wait_for_receipt(&hash, self.confirmations);
        match tokio::time::timeout(self.confirmation_timeout, wait).await {
            Ok(Ok(receipt)) if receipt.success => TransactionResult::succeeded(ChainKind::Evm, receipt.tx_hash),
            Ok(Ok(receipt)) => TransactionResult::failed_with_hash(ChainKind::Evm, TxErrorKind::Reverted, receipt.tx_hash),
            Ok(Err(e)) => {
                warn!(error = %e, tx_hash = %hash, "evm confirmation failed");
                TransactionResult::failed_with_hash(ChainKind::Evm, TxErrorKind::from(&e), hash)
            }
            Err(_) => TransactionResult::failed_with_hash(ChainKind::Evm, TxErrorKind::ConfirmationTimeout, hash),
        }
    }

    async fn dispatch_btc(&self, intent: TransactionIntent) -> TransactionResult {
        if intent.amount > U256::from(u64::MAX) {
            return TransactionResult::failed(ChainKind::Btc, TxErrorKind::SubmitFailed);
        }
        let sats = intent.amount.as_limbs()[0];
        match self.providers.bridge.send_btc(intent.destination.trim(), sats).await {
            Ok(txid) if !txid.is_empty() => TransactionResult::succeeded(ChainKind::Btc, txid),
            Ok(_) => TransactionResult::failed(ChainKind::Btc, TxErrorKind::SubmitFailed),
            Err(e) => {
                warn!(error = %e, "btc send failed");
                TransactionResult::failed(ChainKind::Btc, TxErrorKind::from(&e))
            }
        }
    }
}
