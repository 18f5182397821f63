//! Twinchain: dual-chain (Bitcoin + EVM) wallet session engine.
//!
//! # Architecture
//!
//! ```text
//! Session (state store, owned by the host)
//!   │
//!   ├── BalanceSynchronizer   once per distinct (evm, btc) account pair
//!   │     ├── EVM leg  ─┐
//!   │     └── BTC leg  ─┴─ concurrent, independent
//!   │
//!   ├── TransactionDispatcher  intent → TransactionResult, never errors
//!   │
//!   ├── CopyFeedback           self-clearing "copied" flag
//!   │
//!   └── ChainProviders
//!         ├── WalletBridge      (RpcBridge)
//!         ├── EvmProvider       (EvmRpcProvider)
//!         └── BtcBalanceSource  (BlockcypherClient)
//! ```
//!
//! # Intents
//!
//! | Intent | Method |
//! |--------|--------|
//! | connect | `session.connect()` |
//! | disconnect | `session.disconnect()` |
//! | enter EVM address | `session.set_evm_address_input(addr)` |
//! | enter BTC address | `session.set_btc_address_input(addr)` |
//! | send 0.01 EVM native | `session.submit_evm_tx()` |
//! | send 1 sat | `session.submit_btc_tx()` |
//! | copy | `session.copy_address(addr)` |
//!
//! # Features
//!
//! - `server` (default) - axum router and the `twinchain` binary
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use twinchain::{ChainProviders, Session, SessionConfig};
//!
//! let session = Arc::new(Session::new(providers, SessionConfig::default()));
//! session.connect().await?;
//! let snapshot = session.snapshot().await;
//! println!("{}", snapshot.btc_balance.amount.unwrap_or_default());
//! ```

pub mod balance;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod network;
pub mod providers;
pub mod runtime;
pub mod session;

#[cfg(feature = "server")]
pub mod server;

pub use balance::{BalanceBoard, BalanceState, BalanceStatus, BalanceSynchronizer, SyncOutcome};
pub use dispatch::{TransactionDispatcher, TransactionIntent, TransactionResult};
pub use error::{ProviderError, SessionError, TxErrorKind};
pub use network::{resolve_btc_network, resolve_evm_network, BtcNetwork, EvmNetwork, NetworkLabel};
pub use providers::{
    Account, BitcoinCoreWallet, BlockcypherClient, BtcBalanceSource, ChainKind, ChainProviders, ConnectedAccounts,
    EvmProvider, EvmRpcProvider, EvmTransfer, RpcBridge, TxReceipt, WalletBridge,
};
pub use runtime::{install_signal_handlers, Shutdown};
pub use session::{BridgeConfig, ConnectionState, Session, SessionConfig, SessionSnapshot};

#[cfg(feature = "server")]
pub use server::{create_router, create_router_with_name};

/// Wire the bundled RPC backends from a `BridgeConfig`.
pub fn rpc_providers(config: &BridgeConfig) -> ChainProviders {
    use std::sync::Arc;

    let evm = Arc::new(EvmRpcProvider::new(&config.evm_rpc_url).with_poll_interval(config.receipt_poll_interval));
    let btc = match (&config.btc_rpc_user, &config.btc_rpc_pass) {
        (Some(user), Some(pass)) => BitcoinCoreWallet::with_auth(&config.btc_rpc_url, user, pass),
        _ => BitcoinCoreWallet::new(&config.btc_rpc_url),
    };
    let bridge = Arc::new(RpcBridge::new(evm.clone(), btc));
    let balances = Arc::new(BlockcypherClient::new(&config.balance_api_url));
    ChainProviders::new(bridge, evm, balances)
}
