//! Shared mock providers for session-level tests.
//!
//! Each mock records how often it was called so tests can assert that an
//! operation did or did not reach the adapter.

#![allow(dead_code)]

use alloy_primitives::U256;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use twinchain::network::BtcNetwork;
use twinchain::providers::ProviderResult;
use twinchain::{
    Account, BtcBalanceSource, ChainProviders, ConnectedAccounts, EvmProvider, EvmTransfer, ProviderError, Session,
    SessionConfig, TxReceipt, WalletBridge,
};

pub const EVM_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";
pub const BTC_ADDRESS: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
pub const EVM_TX_HASH: &str = "0xabc0000000000000000000000000000000000000000000000000000000000def";
pub const BTC_TXID: &str = "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16";

/// 0.01234 native units; renders as "0.012".
pub const EVM_BALANCE_WEI: u64 = 12_340_000_000_000_000;
/// 0.0025 BTC.
pub const BTC_BALANCE_SATS: u64 = 250_000;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

pub fn default_accounts() -> ConnectedAccounts {
    ConnectedAccounts::new(Some(Account::evm(EVM_ADDRESS)), vec![Account::btc(BTC_ADDRESS)])
}

// ============================================================================
// WalletBridge
// ============================================================================

pub struct MockBridge {
    pub connect_result: Mutex<ProviderResult<ConnectedAccounts>>,
    pub chain_id: Mutex<u64>,
    pub btc_network: Mutex<String>,
    pub send_result: Mutex<ProviderResult<String>>,
    pub last_send: Mutex<Option<(String, u64)>>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
}

impl Default for MockBridge {
    fn default() -> Self {
        Self {
            connect_result: Mutex::new(Ok(default_accounts())),
            chain_id: Mutex::new(1123),
            btc_network: Mutex::new("testnet".into()),
            send_result: Mutex::new(Ok(BTC_TXID.into())),
            last_send: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
        }
    }
}

impl MockBridge {
    pub fn fail_connect(&self, err: ProviderError) { *lock(&self.connect_result) = Err(err); }
    pub fn set_accounts(&self, accounts: ConnectedAccounts) { *lock(&self.connect_result) = Ok(accounts); }
    pub fn set_chain_id(&self, id: u64) { *lock(&self.chain_id) = id; }
    pub fn set_btc_network(&self, raw: &str) { *lock(&self.btc_network) = raw.into(); }
    pub fn set_send_result(&self, result: ProviderResult<String>) { *lock(&self.send_result) = result; }
    pub fn last_send(&self) -> Option<(String, u64)> { lock(&self.last_send).clone() }
    pub fn connects(&self) -> usize { self.connect_calls.load(Ordering::SeqCst) }
    pub fn sends(&self) -> usize { self.send_calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl WalletBridge for MockBridge {
    async fn connect(&self) -> ProviderResult<ConnectedAccounts> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.connect_result).clone()
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn evm_chain_id(&self) -> ProviderResult<u64> {
        Ok(*lock(&self.chain_id))
    }

    async fn btc_network(&self) -> ProviderResult<String> {
        Ok(lock(&self.btc_network).clone())
    }

    async fn send_btc(&self, destination: &str, amount_sats: u64) -> ProviderResult<String> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_send) = Some((destination.to_string(), amount_sats));
        lock(&self.send_result).clone()
    }
}

// ============================================================================
// EvmProvider
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum ReceiptMode {
    Confirmed,
    Reverted,
    /// Never resolves.
    Pending,
}

pub struct MockEvm {
    pub balance_result: Mutex<ProviderResult<U256>>,
    pub send_result: Mutex<ProviderResult<String>>,
    pub receipt_mode: Mutex<ReceiptMode>,
    pub last_transfer: Mutex<Option<EvmTransfer>>,
    /// When set, `balance` parks until the gate is notified.
    pub balance_gate: Mutex<Option<Arc<Notify>>>,
    pub balance_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
}

impl Default for MockEvm {
    fn default() -> Self {
        Self {
            balance_result: Mutex::new(Ok(U256::from(EVM_BALANCE_WEI))),
            send_result: Mutex::new(Ok(EVM_TX_HASH.into())),
            receipt_mode: Mutex::new(ReceiptMode::Confirmed),
            last_transfer: Mutex::new(None),
            balance_gate: Mutex::new(None),
            balance_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
        }
    }
}

impl MockEvm {
    pub fn set_balance(&self, result: ProviderResult<U256>) { *lock(&self.balance_result) = result; }
    pub fn set_send_result(&self, result: ProviderResult<String>) { *lock(&self.send_result) = result; }
    pub fn set_receipt_mode(&self, mode: ReceiptMode) { *lock(&self.receipt_mode) = mode; }
    pub fn last_transfer(&self) -> Option<EvmTransfer> { lock(&self.last_transfer).clone() }
    pub fn balances(&self) -> usize { self.balance_calls.load(Ordering::SeqCst) }
    pub fn sends(&self) -> usize { self.send_calls.load(Ordering::SeqCst) }

    pub fn gate_balance(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.balance_gate) = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl EvmProvider for MockEvm {
    async fn balance(&self, _address: &str) -> ProviderResult<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.balance_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        lock(&self.balance_result).clone()
    }

    async fn send_transaction(&self, tx: &EvmTransfer) -> ProviderResult<String> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_transfer) = Some(tx.clone());
        lock(&self.send_result).clone()
    }

    async fn wait_for_receipt(&self, tx_hash: &str, _confirmations: u64) -> ProviderResult<TxReceipt> {
        let mode = *lock(&self.receipt_mode);
        match mode {
            ReceiptMode::Confirmed => Ok(TxReceipt { tx_hash: tx_hash.into(), block_number: Some(100), success: true }),
            ReceiptMode::Reverted => Ok(TxReceipt { tx_hash: tx_hash.into(), block_number: Some(100), success: false }),
            ReceiptMode::Pending => std::future::pending().await,
        }
    }
}

// ============================================================================
// BtcBalanceSource
// ============================================================================

pub struct MockBalances {
    pub result: Mutex<ProviderResult<u64>>,
    pub last_network: Mutex<Option<BtcNetwork>>,
    pub calls: AtomicUsize,
}

impl Default for MockBalances {
    fn default() -> Self {
        Self { result: Mutex::new(Ok(BTC_BALANCE_SATS)), last_network: Mutex::new(None), calls: AtomicUsize::new(0) }
    }
}

impl MockBalances {
    pub fn set_result(&self, result: ProviderResult<u64>) { *lock(&self.result) = result; }
    pub fn last_network(&self) -> Option<BtcNetwork> { *lock(&self.last_network) }
    pub fn lookups(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl BtcBalanceSource for MockBalances {
    async fn balance(&self, network: BtcNetwork, _address: &str) -> ProviderResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_network) = Some(network);
        lock(&self.result).clone()
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub bridge: Arc<MockBridge>,
    pub evm: Arc<MockEvm>,
    pub balances: Arc<MockBalances>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            bridge: Arc::new(MockBridge::default()),
            evm: Arc::new(MockEvm::default()),
            balances: Arc::new(MockBalances::default()),
        }
    }

    pub fn providers(&self) -> ChainProviders {
        ChainProviders::new(self.bridge.clone(), self.evm.clone(), self.balances.clone())
    }

    pub fn session(&self) -> Arc<Session> {
        self.session_with(SessionConfig::default())
    }

    pub fn session_with(&self, config: SessionConfig) -> Arc<Session> {
        Arc::new(Session::new(self.providers(), config))
    }
}
