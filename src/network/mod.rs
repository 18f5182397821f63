//! Network resolver - raw chain identifiers to display labels
//!
//! Pure lookups, no I/O. The BTC table also selects the Blockcypher endpoint
//! segment, so balance lookups and the displayed network never disagree.
//!
//! | Raw | Display | Segment |
//! |-----|---------|---------|
//! | EVM `223` | mainnet | - |
//! | EVM `1123` | testnet | - |
//! | EVM other | unknown | - |
//! | BTC `"livenet"` | mainnet | `main` |
//! | BTC other | testnet | `test3` |

use serde::{Deserialize, Serialize};

use crate::providers::ChainKind;

pub const EVM_MAINNET_CHAIN_ID: u64 = 223;
pub const EVM_TESTNET_CHAIN_ID: u64 = 1123;

pub const BTC_LIVENET: &str = "livenet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvmNetwork { Mainnet, Testnet, Unknown }

impl EvmNetwork {
    pub fn as_str(&self) -> &'static str {
        match self { EvmNetwork::Mainnet => "mainnet", EvmNetwork::Testnet => "testnet", EvmNetwork::Unknown => "unknown" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork { Mainnet, Testnet }

impl BtcNetwork {
    pub fn as_str(&self) -> &'static str {
        match self { BtcNetwork::Mainnet => "mainnet", BtcNetwork::Testnet => "testnet" }
    }

    /// Blockcypher path segment for this network.
    pub fn segment(&self) -> &'static str {
        match self { BtcNetwork::Mainnet => "main", BtcNetwork::Testnet => "test3" }
    }
}

/// Identifier as reported by the bridge: numeric for EVM, string for BTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNetworkId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLabel {
    pub chain: ChainKind,
    pub raw_id: RawNetworkId,
    pub display_name: String,
}

pub fn resolve_evm_network(chain_id: u64) -> EvmNetwork {
    match chain_id {
        EVM_MAINNET_CHAIN_ID => EvmNetwork::Mainnet,
        EVM_TESTNET_CHAIN_ID => EvmNetwork::Testnet,
        _ => EvmNetwork::Unknown,
    }
}

pub fn resolve_btc_network(raw: &str) -> BtcNetwork {
    if raw == BTC_LIVENET { BtcNetwork::Mainnet } else { BtcNetwork::Testnet }
}

pub fn evm_label(chain_id: u64) -> NetworkLabel {
    NetworkLabel {
        chain: ChainKind::Evm,
        raw_id: RawNetworkId::Number(chain_id),
        display_name: resolve_evm_network(chain_id).as_str().into(),
    }
}

pub fn btc_label(raw: &str) -> NetworkLabel {
    NetworkLabel {
        chain: ChainKind::Btc,
        raw_id: RawNetworkId::Text(raw.into()),
        display_name: resolve_btc_network(raw).as_str().into(),
    }
}
