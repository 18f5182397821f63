//! BitcoinCoreWallet - Bitcoin Core wallet RPC as the BTC wallet capability
//!
//! Reports the network the way browser wallets do: `"livenet"` for mainnet,
//! `"testnet"` otherwise.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::rpc::JsonRpcClient;
use super::ProviderResult;
use crate::core::units::format_btc_amount;
use crate::error::ProviderError;
use crate::network::BTC_LIVENET;

#[derive(Debug, Deserialize)]
struct BlockchainInfo { chain: String }

#[derive(Debug, Deserialize)]
struct ReceivedByAddress { address: String }

pub struct BitcoinCoreWallet {
    rpc: JsonRpcClient,
}

impl BitcoinCoreWallet {
    pub fn new(url: impl Into<String>) -> Self { Self { rpc: JsonRpcClient::new(url) } }

    pub fn with_auth(url: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self { rpc: JsonRpcClient::new(url).with_basic_auth(user, pass) }
    }

    /// Wallet addresses, oldest first. A fresh wallet gets one new address.
    pub async fn accounts(&self) -> ProviderResult<Vec<String>> {
        let received: Vec<ReceivedByAddress> = self.rpc.call("listreceivedbyaddress", json!([0, true])).await?;
        let addresses: Vec<String> = received.into_iter().map(|r| r.address).collect();
        if !addresses.is_empty() {
            return Ok(addresses);
        }
        debug!("wallet has no addresses yet, requesting one");
        let address: String = self.rpc.call("getnewaddress", json!([])).await?;
        Ok(vec![address])
    }

    pub async fn network(&self) -> ProviderResult<String> {
        let info: BlockchainInfo = self.rpc.call("getblockchaininfo", json!([])).await?;
        Ok(bridge_network_name(&info.chain).into())
    }

    pub async fn send(&self, destination: &str, amount_sats: u64) -> ProviderResult<String> {
        let amount = format_btc_amount(amount_sats);
        let txid: String = self.rpc.call("sendtoaddress", json!([destination, amount])).await.map_err(|e| match e {
            ProviderError::Rpc(reason) | ProviderError::Malformed(reason) => ProviderError::Submit(reason),
            other => other,
        })?;
        info!(%txid, destination, amount_sats, "btc transaction broadcast");
        Ok(txid)
    }
}

fn bridge_network_name(chain: &str) -> &'static str {
    if chain == "main" { BTC_LIVENET } else { "testnet" }
}
