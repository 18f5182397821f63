//! Session configuration - passed from the host application

use alloy_primitives::U256;
use std::time::Duration;

use crate::core::units::{DEFAULT_BTC_TRANSFER_SATS, DEFAULT_EVM_TRANSFER_WEI};

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_COPY_FEEDBACK_TTL: Duration = Duration::from_secs(2);

/// Engine behavior knobs. Host constructs this.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Connect on `Session::start` without an explicit user intent.
    pub auto_connect: bool,
    pub confirmations: u64,
    pub confirmation_timeout: Duration,
    pub copy_feedback_ttl: Duration,
    pub evm_transfer_wei: U256,
    pub btc_transfer_sats: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_connect: false,
            confirmations: 1,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            copy_feedback_ttl: DEFAULT_COPY_FEEDBACK_TTL,
            evm_transfer_wei: U256::from(DEFAULT_EVM_TRANSFER_WEI),
            btc_transfer_sats: DEFAULT_BTC_TRANSFER_SATS,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_auto_connect(mut self, enabled: bool) -> Self { self.auto_connect = enabled; self }
    pub fn with_confirmations(mut self, n: u64) -> Self { self.confirmations = n; self }
    pub fn with_confirmation_timeout(mut self, t: Duration) -> Self { self.confirmation_timeout = t; self }
    pub fn with_copy_feedback_ttl(mut self, t: Duration) -> Self { self.copy_feedback_ttl = t; self }
    pub fn with_evm_transfer_wei(mut self, wei: U256) -> Self { self.evm_transfer_wei = wei; self }
    pub fn with_btc_transfer_sats(mut self, sats: u64) -> Self { self.btc_transfer_sats = sats; self }
}

/// Upstream endpoints for the bundled RPC backends.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub evm_rpc_url: String,
    pub btc_rpc_url: String,
    pub btc_rpc_user: Option<String>,
    pub btc_rpc_pass: Option<String>,
    pub balance_api_url: String,
    pub receipt_poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            evm_rpc_url: "http://127.0.0.1:8545".into(),
            btc_rpc_url: "http://127.0.0.1:18332".into(),
            btc_rpc_user: None,
            btc_rpc_pass: None,
            balance_api_url: crate::core::paths::blockcypher::DEFAULT_BASE_URL.into(),
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

impl BridgeConfig {
    pub fn with_evm_rpc(mut self, url: impl Into<String>) -> Self { self.evm_rpc_url = url.into(); self }
    pub fn with_btc_rpc(mut self, url: impl Into<String>) -> Self { self.btc_rpc_url = url.into(); self }
    pub fn with_btc_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.btc_rpc_user = Some(user.into());
        self.btc_rpc_pass = Some(pass.into());
        self
    }
    pub fn with_balance_api(mut self, url: impl Into<String>) -> Self { self.balance_api_url = url.into(); self }
    pub fn with_receipt_poll_interval(mut self, t: Duration) -> Self { self.receipt_poll_interval = t; self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_amounts() {
        let config = SessionConfig::default();
        assert!(!config.auto_connect);
        assert_eq!(config.confirmations, 1);
        assert_eq!(config.copy_feedback_ttl, Duration::from_secs(2));
        assert_eq!(config.btc_transfer_sats, 1);
        assert_eq!(config.evm_transfer_wei, U256::from(10_000_000_000_000_000u64));
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::new().with_auto_connect(true).with_confirmations(3);
        assert!(config.auto_connect);
        assert_eq!(config.confirmations, 3);
    }
}
