//! Session - the state store the presentation layer reads and drives
//!
//! ```text
//!   Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!        ▲                        │                  │
//!        └────────── err ─────────┘                  │
//!        └────────────────── disconnect ─────────────┘
//! ```
//!
//! Balances and network labels only mean something while `Connected`.
//! Transaction intents outside `Connected` are rejected without touching
//! any provider.

mod config;
mod copy;

pub use config::{BridgeConfig, SessionConfig, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_COPY_FEEDBACK_TTL};
pub use copy::CopyFeedback;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::balance::{BalanceBoard, BalanceState, BalanceSynchronizer, SyncOutcome};
use crate::core::units::truncate_address;
use crate::dispatch::{TransactionDispatcher, TransactionIntent, TransactionResult};
use crate::error::{SessionError, TxErrorKind};
use crate::network::{evm_label, NetworkLabel};
use crate::providers::{Account, ChainKind, ChainProviders, ConnectedAccounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState { #[default] Disconnected, Connecting, Connected }

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub chain: ChainKind,
    pub address: String,
    pub short_address: String,
    pub is_connected: bool,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            chain: account.chain,
            address: account.address.clone(),
            short_address: truncate_address(&account.address),
            is_connected: account.is_connected,
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub accounts: Vec<AccountView>,
    pub evm_network: Option<NetworkLabel>,
    pub btc_network: Option<NetworkLabel>,
    pub evm_balance: BalanceState,
    pub btc_balance: BalanceState,
    pub evm_address_input: String,
    pub btc_address_input: String,
    pub last_result: Option<TransactionResult>,
    pub last_error: Option<String>,
    pub copied: Option<String>,
}

#[derive(Debug, Default)]
struct SessionInner {
    connection: ConnectionState,
    accounts: ConnectedAccounts,
    evm_network: Option<NetworkLabel>,
    evm_input: String,
    btc_input: String,
    last_result: Option<TransactionResult>,
    last_error: Option<String>,
}

pub struct Session {
    providers: ChainProviders,
    config: SessionConfig,
    balances: BalanceSynchronizer,
    dispatcher: TransactionDispatcher,
    copy: CopyFeedback,
    inner: RwLock<SessionInner>,
}

impl Session {
    pub fn new(providers: ChainProviders, config: SessionConfig) -> Self {
        Self {
            balances: BalanceSynchronizer::new(providers.clone()),
            dispatcher: TransactionDispatcher::new(providers.clone(), config.confirmations, config.confirmation_timeout),
            copy: CopyFeedback::new(config.copy_feedback_ttl),
            inner: RwLock::new(SessionInner::default()),
            providers,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig { &self.config }

    /// Host startup hook. Connects only when `auto_connect` is set.
    pub async fn start(&self) -> Result<Option<ConnectedAccounts>, SessionError> {
        if !self.config.auto_connect {
            return Ok(None);
        }
        info!("auto-connect enabled");
        self.connect().await.map(Some)
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.read().await.connection
    }

    /// Connect through the bridge, resolve the EVM network, then sync balances.
    pub async fn connect(&self) -> Result<ConnectedAccounts, SessionError> {
        {
            let mut inner = self.inner.write().await;
            if inner.connection != ConnectionState::Disconnected {
                return Err(SessionError::Busy(inner.connection.as_str()));
            }
            inner.connection = ConnectionState::Connecting;
            inner.last_error = None;
        }
        info!("connecting wallet");

        let accounts = match self.providers.bridge.connect().await {
            Ok(accounts) => accounts,
            Err(e) => {
                let err = SessionError::Connection(e);
                warn!(error = %err, "wallet connection failed");
                let mut inner = self.inner.write().await;
                inner.connection = ConnectionState::Disconnected;
                inner.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        let evm_network = match self.providers.bridge.evm_chain_id().await {
            Ok(chain_id) => Some(evm_label(chain_id)),
            Err(e) => {
                warn!(error = %e, "evm chain id unavailable");
                None
            }
        };

        {
            let mut inner = self.inner.write().await;
            inner.connection = ConnectionState::Connected;
            inner.accounts = accounts.clone();
            inner.evm_network = evm_network;
        }
        info!(
            evm = accounts.evm.as_ref().map(|a| a.address.as_str()).unwrap_or("-"),
            btc = accounts.btc.len(),
            "wallet connected"
        );

        self.balances.on_accounts(&accounts).await;
        Ok(accounts)
    }

    /// Clear accounts, balances, labels and inputs.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        if self.connection_state().await != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }
        if let Err(e) = self.providers.bridge.disconnect().await {
            warn!(error = %e, "bridge disconnect failed, clearing session anyway");
        }
        self.balances.reset().await;
        self.copy.clear().await;
        *self.inner.write().await = SessionInner::default();
        info!("wallet disconnected");
        Ok(())
    }

    /// Bridge reported a new account set. Re-syncs only if it changed.
    pub async fn on_accounts_changed(&self, accounts: ConnectedAccounts) -> Result<SyncOutcome, SessionError> {
        {
            let mut inner = self.inner.write().await;
            if inner.connection != ConnectionState::Connected {
                return Err(SessionError::NotConnected);
            }
            inner.accounts = accounts.clone();
        }
        Ok(self.balances.on_accounts(&accounts).await)
    }

    /// Bridge reported a new EVM chain id.
    pub async fn on_chain_changed(&self, chain_id: u64) -> Result<(), SessionError> {
        let mut inner = self.inner.write().await;
        if inner.connection != ConnectionState::Connected {
            return Err(SessionError::NotConnected);
        }
        inner.evm_network = Some(evm_label(chain_id));
        Ok(())
    }

    /// Re-run the balance sync for the current accounts.
    pub async fn refresh(&self) -> Result<SyncOutcome, SessionError> {
        let accounts = {
            let inner = self.inner.read().await;
            if inner.connection != ConnectionState::Connected {
                return Err(SessionError::NotConnected);
            }
            inner.accounts.clone()
        };
        Ok(self.balances.refresh(&accounts).await)
    }

    pub async fn set_evm_address_input(&self, value: impl Into<String>) {
        self.inner.write().await.evm_input = value.into();
    }

    pub async fn set_btc_address_input(&self, value: impl Into<String>) {
        self.inner.write().await.btc_input = value.into();
    }

    /// Send the configured EVM amount to the EVM address input.
    pub async fn submit_evm_tx(&self) -> TransactionResult {
        let intent = {
            let inner = self.inner.read().await;
            match (inner.connection, inner.accounts.evm.as_ref()) {
                (ConnectionState::Connected, Some(account)) => {
                    TransactionIntent::evm(account.address.clone(), inner.evm_input.clone(), self.config.evm_transfer_wei)
                }
                _ => return TransactionResult::failed(ChainKind::Evm, TxErrorKind::NotConnected),
            }
        };
        self.submit(intent).await
    }

    /// Send the configured BTC amount to the BTC address input.
    pub async fn submit_btc_tx(&self) -> TransactionResult {
        let intent = {
            let inner = self.inner.read().await;
            if inner.connection != ConnectionState::Connected {
                return TransactionResult::failed(ChainKind::Btc, TxErrorKind::NotConnected);
            }
            TransactionIntent::btc(inner.btc_input.clone(), self.config.btc_transfer_sats)
        };
        self.submit(intent).await
    }

    async fn submit(&self, intent: TransactionIntent) -> TransactionResult {
        let (chain, destination) = (intent.chain, intent.destination.clone());
        let result = self.dispatcher.dispatch(intent.submit()).await;

        let mut inner = self.inner.write().await;
        if inner.connection == ConnectionState::Connected {
            if result.success {
                let input = match chain {
                    ChainKind::Evm => &mut inner.evm_input,
                    ChainKind::Btc => &mut inner.btc_input,
                };
                // Keep anything typed while the transaction was in flight.
                if *input == destination {
                    input.clear();
                }
            }
            inner.last_result = Some(result.clone());
        }
        result
    }

    pub async fn copy_address(&self, value: impl Into<String>) {
        self.copy.copy(value).await;
    }

    pub async fn copied(&self) -> Option<String> {
        self.copy.current().await
    }

    pub async fn balances(&self) -> BalanceBoard {
        self.balances.board().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let board = self.balances.board().await;
        let copied = self.copy.current().await;
        let inner = self.inner.read().await;
        SessionSnapshot {
            connection: inner.connection,
            accounts: inner.accounts.all().iter().map(AccountView::from).collect(),
            evm_network: inner.evm_network.clone(),
            btc_network: board.btc_network,
            evm_balance: board.evm,
            btc_balance: board.btc,
            evm_address_input: inner.evm_input.clone(),
            btc_address_input: inner.btc_input.clone(),
            last_result: inner.last_result.clone(),
            last_error: inner.last_error.clone(),
            copied,
        }
    }
}
