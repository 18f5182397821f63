//! Balance synchronizer - concurrent EVM + BTC balance refresh
//!
//! Runs once per distinct `(evm address, btc accounts)` pair. Each run takes a
//! fresh epoch; results from an older epoch (superseded run or a reset after
//! disconnect) are dropped instead of written.
//!
//! ```text
//! on_accounts(accounts)
//!     │  same key as last run? → Unchanged
//!     ▼
//! both legs → Loading
//!     │
//!     ├── EVM leg: evm.balance(addr) → wei → "0.012"
//!     │
//!     └── BTC leg: bridge.btc_network() → label + segment
//!                  btc_balances.balance(segment, accounts[0]) → sats → "0.0025"
//!                  429 → RateLimited
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::units::{format_sats, format_wei_3dp};
use crate::network::{btc_label, resolve_btc_network, NetworkLabel};
use crate::providers::{ChainKind, ChainProviders, ConnectedAccounts};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus { Idle, Loading, Ready, RateLimited, Error }

/// Per-chain balance as shown to the user. `amount` is set only when `Ready`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceState {
    pub chain: ChainKind,
    pub amount: Option<String>,
    pub status: BalanceStatus,
    pub error_message: Option<String>,
}

impl BalanceState {
    pub fn idle(chain: ChainKind) -> Self { Self::with_status(chain, BalanceStatus::Idle, None) }
    pub fn loading(chain: ChainKind) -> Self { Self::with_status(chain, BalanceStatus::Loading, None) }
    pub fn rate_limited(chain: ChainKind) -> Self { Self::with_status(chain, BalanceStatus::RateLimited, Some(RATE_LIMITED_MESSAGE)) }
    pub fn error(chain: ChainKind) -> Self { Self::with_status(chain, BalanceStatus::Error, Some(FETCH_ERROR_MESSAGE)) }

    pub fn ready(chain: ChainKind, amount: impl Into<String>) -> Self {
        Self { chain, amount: Some(amount.into()), status: BalanceStatus::Ready, error_message: None }
    }

    fn with_status(chain: ChainKind, status: BalanceStatus, message: Option<&str>) -> Self {
        Self { chain, amount: None, status, error_message: message.map(String::from) }
    }
}

/// Everything the synchronizer owns. Read-only outside this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceBoard {
    pub evm: BalanceState,
    pub btc: BalanceState,
    pub btc_network: Option<NetworkLabel>,
}

impl Default for BalanceBoard {
    fn default() -> Self {
        Self { evm: BalanceState::idle(ChainKind::Evm), btc: BalanceState::idle(ChainKind::Btc), btc_network: None }
    }
}

/// Identity of the account set a run was made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncKey {
    pub evm: Option<String>,
    pub btc: Vec<String>,
}

impl From<&ConnectedAccounts> for SyncKey {
    fn from(accounts: &ConnectedAccounts) -> Self {
        Self {
            evm: accounts.evm.as_ref().map(|a| a.address.clone()),
            btc: accounts.btc.iter().map(|a| a.address.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Same account set as the previous run.
    Unchanged,
    /// EVM or BTC account missing; balances left `Idle`.
    MissingAccounts,
    /// A newer run or a reset took over before this one finished.
    Superseded,
    Synced { evm: BalanceStatus, btc: BalanceStatus },
}

struct Inner {
    board: BalanceBoard,
    epoch: u64,
    last_key: Option<SyncKey>,
}

pub struct BalanceSynchronizer {
    providers: ChainProviders,
    inner: RwLock<Inner>,
}

impl BalanceSynchronizer {
    pub fn new(providers: ChainProviders) -> Self {
        Self { providers, inner: RwLock::new(Inner { board: BalanceBoard::default(), epoch: 0, last_key: None }) }
    }

    pub async fn board(&self) -> BalanceBoard {
        self.inner.read().await.board.clone()
    }

    /// Sync if the account set differs from the last one synced.
    pub async fn on_accounts(&self, accounts: &ConnectedAccounts) -> SyncOutcome {
        let key = SyncKey::from(accounts);
        let epoch = {
            let mut inner = self.inner.write().await;
            if inner.last_key.as_ref() == Some(&key) {
                debug!("account set unchanged, skipping balance sync");
                return SyncOutcome::Unchanged;
            }
            inner.last_key = Some(key);
            inner.epoch += 1;
            inner.epoch
        };
        self.run(epoch, accounts).await
    }

    /// Sync unconditionally (caller-level retry).
    pub async fn refresh(&self, accounts: &ConnectedAccounts) -> SyncOutcome {
        let epoch = {
            let mut inner = self.inner.write().await;
            inner.last_key = Some(SyncKey::from(accounts));
            inner.epoch += 1;
            inner.epoch
        };
        self.run(epoch, accounts).await
    }

    /// Back to `Idle`, forget the last key, drop in-flight results.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.epoch += 1;
        inner.last_key = None;
        inner.board = BalanceBoard::default();
    }

    async fn run(&self, epoch: u64, accounts: &ConnectedAccounts) -> SyncOutcome {
        let (evm_address, btc_address) = match (accounts.evm.as_ref(), accounts.primary_btc()) {
            (Some(evm), Some(btc)) => (evm.address.as_str(), btc.address.as_str()),
            _ => {
                self.publish(epoch, |board| {
                    board.evm = BalanceState::idle(ChainKind::Evm);
                    board.btc = BalanceState::idle(ChainKind::Btc);
                }).await;
                return SyncOutcome::MissingAccounts;
            }
        };

        let started = self.publish(epoch, |board| {
            board.evm = BalanceState::loading(ChainKind::Evm);
            board.btc = BalanceState::loading(ChainKind::Btc);
        }).await;
        if !started {
            return SyncOutcome::Superseded;
        }
        info!(evm = evm_address, btc = btc_address, "syncing balances");

        let (evm, btc) = tokio::join!(self.sync_evm(epoch, evm_address), self.sync_btc(epoch, btc_address));

        if self.inner.read().await.epoch != epoch {
            return SyncOutcome::Superseded;
        }
        SyncOutcome::Synced { evm, btc }
    }

    async fn sync_evm(&self, epoch: u64, address: &str) -> BalanceStatus {
        let state = match self.providers.evm.balance(address).await {
            Ok(wei) => BalanceState::ready(ChainKind::Evm, format_wei_3dp(wei)),
            Err(e) => {
                warn!(error = %e, address, "evm balance fetch failed");
                BalanceState::error(ChainKind::Evm)
            }
        };
        let status = state.status;
        self.publish(epoch, |board| board.evm = state).await;
        status
    }

    async fn sync_btc(&self, epoch: u64, address: &str) -> BalanceStatus {
        let state = match self.providers.bridge.btc_network().await {
            Ok(raw) => {
                let network = resolve_btc_network(&raw);
                let label = btc_label(&raw);
                self.publish(epoch, |board| board.btc_network = Some(label)).await;

                match self.providers.btc_balances.balance(network, address).await {
                    Ok(sats) => BalanceState::ready(ChainKind::Btc, format_sats(sats)),
                    Err(e) if e.is_rate_limited() => {
                        warn!(address, "btc balance lookup rate limited");
                        BalanceState::rate_limited(ChainKind::Btc)
                    }
                    Err(e) => {
                        warn!(error = %e, address, "btc balance fetch failed");
                        BalanceState::error(ChainKind::Btc)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "btc network query failed");
                BalanceState::error(ChainKind::Btc)
            }
        };
        let status = state.status;
        self.publish(epoch, |board| board.btc = state).await;
        status
    }

    /// Apply `update` only if `epoch` is still current.
    async fn publish(&self, epoch: u64, update: impl FnOnce(&mut BalanceBoard)) -> bool {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            return false;
        }
        update(&mut inner.board);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Account;

    #[test]
    fn amount_only_when_ready() {
        assert_eq!(BalanceState::idle(ChainKind::Evm).amount, None);
        assert_eq!(BalanceState::rate_limited(ChainKind::Btc).amount, None);
        assert_eq!(BalanceState::rate_limited(ChainKind::Btc).error_message.as_deref(), Some(RATE_LIMITED_MESSAGE));
        assert_eq!(BalanceState::error(ChainKind::Btc).error_message.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert_eq!(BalanceState::ready(ChainKind::Btc, "0.0025").status, BalanceStatus::Ready);
    }

    #[test]
    fn sync_key_tracks_full_btc_snapshot() {
        let a = ConnectedAccounts::new(Some(Account::evm("0xaa")), vec![Account::btc("bc1a")]);
        let b = ConnectedAccounts::new(Some(Account::evm("0xaa")), vec![Account::btc("bc1a"), Account::btc("bc1b")]);
        assert_ne!(SyncKey::from(&a), SyncKey::from(&b));
        assert_eq!(SyncKey::from(&a), SyncKey::from(&a.clone()));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&BalanceStatus::RateLimited).unwrap(), "\"rate_limited\"");
    }
}
