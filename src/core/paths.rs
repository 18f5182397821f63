//! Path constants: HTTP routes served to the presentation layer and the
//! upstream balance endpoint layout.
//!
//! Shared by the router, the CLI usage text and the tests.

/// Routes served by `server::create_router`
pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const SESSION: &str = "/session";
    pub const CONNECT: &str = "/session/connect";
    pub const DISCONNECT: &str = "/session/disconnect";
    pub const REFRESH: &str = "/session/refresh";
    pub const EVM_INPUT: &str = "/inputs/evm";
    pub const BTC_INPUT: &str = "/inputs/btc";
    pub const EVM_TX: &str = "/tx/evm";
    pub const BTC_TX: &str = "/tx/btc";
    pub const COPY: &str = "/copy";

    pub const ALL: &[&str] = &[
        HEALTH, SESSION, CONNECT, DISCONNECT, REFRESH, EVM_INPUT, BTC_INPUT, EVM_TX, BTC_TX, COPY,
    ];
}

/// Blockcypher address-balance lookup
pub mod blockcypher {
    pub const DEFAULT_BASE_URL: &str = "https://api.blockcypher.com";

    /// `{base}/v1/btc/{segment}/addrs/{address}/balance`
    pub fn balance_url(base: &str, segment: &str, address: &str) -> String {
        format!("{}/v1/btc/{}/addrs/{}/balance", base.trim_end_matches('/'), segment, address)
    }
}
