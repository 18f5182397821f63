//! RpcBridge - WalletBridge over an EVM endpoint and a Bitcoin Core wallet.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::{Account, BitcoinCoreWallet, ConnectedAccounts, EvmRpcProvider, ProviderResult, WalletBridge};
use crate::error::ProviderError;

pub struct RpcBridge {
    evm: Arc<EvmRpcProvider>,
    btc: BitcoinCoreWallet,
    connected: RwLock<bool>,
}

impl RpcBridge {
    pub fn new(evm: Arc<EvmRpcProvider>, btc: BitcoinCoreWallet) -> Self {
        Self { evm, btc, connected: RwLock::new(false) }
    }

    async fn require_connected(&self) -> ProviderResult<()> {
        if *self.connected.read().await { Ok(()) } else { Err(ProviderError::NotConnected) }
    }
}

#[async_trait]
impl WalletBridge for RpcBridge {
    async fn connect(&self) -> ProviderResult<ConnectedAccounts> {
        let evm = self.evm.request_accounts().await.map_err(connection_error)?;
        let btc = self.btc.accounts().await.map_err(connection_error)?;
        if evm.is_empty() && btc.is_empty() {
            return Err(ProviderError::Connection("no accounts exposed".into()));
        }
        *self.connected.write().await = true;
        info!(evm = evm.len(), btc = btc.len(), "bridge connected");
        Ok(ConnectedAccounts::new(
            evm.into_iter().next().map(Account::evm),
            btc.into_iter().map(Account::btc).collect(),
        ))
    }

    async fn disconnect(&self) -> ProviderResult<()> {
        *self.connected.write().await = false;
        Ok(())
    }

    async fn evm_chain_id(&self) -> ProviderResult<u64> {
        self.evm.chain_id().await
    }

    async fn btc_network(&self) -> ProviderResult<String> {
        self.btc.network().await
    }

    async fn send_btc(&self, destination: &str, amount_sats: u64) -> ProviderResult<String> {
        self.require_connected().await?;
        self.btc.send(destination, amount_sats).await
    }
}

fn connection_error(err: ProviderError) -> ProviderError {
    match err {
        ProviderError::Rejected(_) | ProviderError::Connection(_) => err,
        other => ProviderError::Connection(other.to_string()),
    }
}
