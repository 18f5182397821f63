//! BlockcypherClient - BTC address balance via api.blockcypher.com

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BtcBalanceSource, ProviderResult};
use crate::core::paths::blockcypher;
use crate::error::ProviderError;
use crate::network::BtcNetwork;

#[derive(Debug, Deserialize)]
struct AddressBalance { balance: u64 }

pub struct BlockcypherClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for BlockcypherClient {
    fn default() -> Self { Self::new(blockcypher::DEFAULT_BASE_URL) }
}

impl BlockcypherClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    pub fn base_url(&self) -> &str { &self.base_url }
}

#[async_trait]
impl BtcBalanceSource for BlockcypherClient {
    async fn balance(&self, network: BtcNetwork, address: &str) -> ProviderResult<u64> {
        let url = blockcypher::balance_url(&self.base_url, network.segment(), address);
        debug!(%url, "btc balance lookup");
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(address, "blockcypher rate limit hit");
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Rpc(format!("blockcypher: HTTP {}", status)));
        }
        let body: AddressBalance = response.json().await.map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(body.balance)
    }
}
