//! EvmRpcProvider - Ethereum JSON-RPC backend
//!
//! Signing is delegated to whatever sits behind the endpoint (a wallet
//! bridge or an unlocked dev node) via `eth_sendTransaction`.

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::rpc::JsonRpcClient;
use super::{EvmProvider, EvmTransfer, ProviderResult, TxReceipt};
use crate::core::units::{parse_hex_quantity, to_hex_quantity};
use crate::error::ProviderError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub struct EvmRpcProvider {
    rpc: JsonRpcClient,
    poll_interval: Duration,
}

impl EvmRpcProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self { rpc: JsonRpcClient::new(url), poll_interval: DEFAULT_POLL_INTERVAL }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval = interval; self }

    /// Ask the wallet for its accounts, falling back to `eth_accounts` for
    /// endpoints that do not implement EIP-1102.
    pub async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        match self.rpc.call::<Vec<String>>("eth_requestAccounts", json!([])).await {
            Ok(accounts) => Ok(accounts),
            Err(ProviderError::Rpc(reason)) => {
                debug!(%reason, "eth_requestAccounts unavailable, using eth_accounts");
                self.rpc.call("eth_accounts", json!([])).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn chain_id(&self) -> ProviderResult<u64> {
        let raw: String = self.rpc.call("eth_chainId", json!([])).await?;
        parse_hex_u64(&raw).ok_or_else(|| ProviderError::Malformed(format!("eth_chainId: {}", raw)))
    }

    async fn block_number(&self) -> ProviderResult<u64> {
        let raw: String = self.rpc.call("eth_blockNumber", json!([])).await?;
        parse_hex_u64(&raw).ok_or_else(|| ProviderError::Malformed(format!("eth_blockNumber: {}", raw)))
    }
}

#[async_trait]
impl EvmProvider for EvmRpcProvider {
    async fn balance(&self, address: &str) -> ProviderResult<U256> {
        let raw: String = self.rpc.call("eth_getBalance", json!([address, "latest"])).await?;
        parse_hex_quantity(&raw).ok_or_else(|| ProviderError::Malformed(format!("eth_getBalance: {}", raw)))
    }

    async fn send_transaction(&self, tx: &EvmTransfer) -> ProviderResult<String> {
        let params = json!([{
            "from": tx.from,
            "to": tx.to,
            "value": to_hex_quantity(tx.value),
            "data": format!("0x{}", hex::encode(&tx.data)),
        }]);
        let hash: String = self.rpc.call("eth_sendTransaction", params).await.map_err(|e| match e {
            ProviderError::Rpc(reason) | ProviderError::Malformed(reason) => ProviderError::Submit(reason),
            other => other,
        })?;
        info!(tx_hash = %hash, to = %tx.to, "evm transaction submitted");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &str, confirmations: u64) -> ProviderResult<TxReceipt> {
        loop {
            let receipt: Option<RawReceipt> = self.rpc.call_optional("eth_getTransactionReceipt", json!([tx_hash])).await?;
            if let Some(block) = receipt.as_ref().and_then(|r| r.block_number.as_deref()).and_then(parse_hex_u64) {
                let head = self.block_number().await?;
                let depth = head.saturating_sub(block) + 1;
                if depth >= confirmations.max(1) {
                    let r = receipt.ok_or_else(|| ProviderError::Malformed("receipt vanished".into()))?;
                    return Ok(TxReceipt {
                        tx_hash: r.transaction_hash,
                        block_number: Some(block),
                        success: r.status.as_deref().and_then(parse_hex_u64).map(|s| s == 1).unwrap_or(true),
                    });
                }
                debug!(tx_hash, depth, confirmations, "waiting for confirmations");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn parse_hex_u64(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x")?;
    if digits.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_u64() {
        assert_eq!(parse_hex_u64("0x463"), Some(1123));
        assert_eq!(parse_hex_u64("0xdf"), Some(223));
        assert_eq!(parse_hex_u64("0x"), Some(0));
        assert_eq!(parse_hex_u64("223"), None);
    }
}
