//! Chain providers - typed capabilities the session engine consumes
//!
//! Three seams, each an `async_trait` so production backends and test mocks
//! plug in the same way:
//!
//! ```text
//! ChainProviders
//!     │
//!     ├── bridge: WalletBridge        connect / disconnect / chain id /
//!     │                               btc network / btc send
//!     ├── evm: EvmProvider            balance / signer send / receipt
//!     │
//!     └── btc_balances: BtcBalanceSource   address balance by segment
//! ```
//!
//! None of the capabilities retry. Retry is a caller decision.
//!
//! | Backend | Implements | Transport |
//! |---------|------------|-----------|
//! | `RpcBridge` | WalletBridge | EVM + Bitcoin Core JSON-RPC |
//! | `EvmRpcProvider` | EvmProvider | Ethereum JSON-RPC |
//! | `BlockcypherClient` | BtcBalanceSource | HTTPS GET |

mod blockcypher;
mod bridge;
mod btc;
mod evm;
mod rpc;

pub use blockcypher::BlockcypherClient;
pub use bridge::RpcBridge;
pub use btc::BitcoinCoreWallet;
pub use evm::EvmRpcProvider;
pub use rpc::JsonRpcClient;

use alloy_primitives::U256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ProviderError;
use crate::network::BtcNetwork;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind { Evm, Btc }

impl ChainKind {
    pub fn as_str(&self) -> &'static str {
        match self { ChainKind::Evm => "evm", ChainKind::Btc => "btc" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub chain: ChainKind,
    pub address: String,
    pub is_connected: bool,
}

impl Account {
    pub fn evm(address: impl Into<String>) -> Self {
        Self { chain: ChainKind::Evm, address: address.into(), is_connected: true }
    }

    pub fn btc(address: impl Into<String>) -> Self {
        Self { chain: ChainKind::Btc, address: address.into(), is_connected: true }
    }
}

/// Identity pair returned by a successful bridge connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccounts {
    pub evm: Option<Account>,
    pub btc: Vec<Account>,
}

impl ConnectedAccounts {
    pub fn new(evm: Option<Account>, btc: Vec<Account>) -> Self { Self { evm, btc } }

    pub fn primary_btc(&self) -> Option<&Account> { self.btc.first() }

    pub fn is_empty(&self) -> bool { self.evm.is_none() && self.btc.is_empty() }

    pub fn all(&self) -> Vec<Account> {
        self.evm.iter().cloned().chain(self.btc.iter().cloned()).collect()
    }
}

/// Native-value transfer handed to the EVM signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTransfer {
    pub from: String,
    pub to: String,
    pub value: U256,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// External wallet bridge (BTC wallet capability + EVM identity).
#[async_trait]
pub trait WalletBridge: Send + Sync {
    async fn connect(&self) -> ProviderResult<ConnectedAccounts>;
    async fn disconnect(&self) -> ProviderResult<()>;
    async fn evm_chain_id(&self) -> ProviderResult<u64>;
    /// `"livenet"` for mainnet, anything else is a test network.
    async fn btc_network(&self) -> ProviderResult<String>;
    async fn send_btc(&self, destination: &str, amount_sats: u64) -> ProviderResult<String>;
}

/// EVM RPC + signer.
#[async_trait]
pub trait EvmProvider: Send + Sync {
    async fn balance(&self, address: &str) -> ProviderResult<U256>;
    /// Sign with the connected account and submit. Returns the tx hash.
    async fn send_transaction(&self, tx: &EvmTransfer) -> ProviderResult<String>;
    /// Resolves once `tx_hash` has `confirmations` confirmations.
    async fn wait_for_receipt(&self, tx_hash: &str, confirmations: u64) -> ProviderResult<TxReceipt>;
}

/// BTC address balance lookup, in satoshis.
#[async_trait]
pub trait BtcBalanceSource: Send + Sync {
    async fn balance(&self, network: BtcNetwork, address: &str) -> ProviderResult<u64>;
}

/// Adapter façade handed to the session.
#[derive(Clone)]
pub struct ChainProviders {
    pub bridge: Arc<dyn WalletBridge>,
    pub evm: Arc<dyn EvmProvider>,
    pub btc_balances: Arc<dyn BtcBalanceSource>,
}

impl ChainProviders {
    pub fn new(bridge: Arc<dyn WalletBridge>, evm: Arc<dyn EvmProvider>, btc_balances: Arc<dyn BtcBalanceSource>) -> Self {
        Self { bridge, evm, btc_balances }
    }
}
