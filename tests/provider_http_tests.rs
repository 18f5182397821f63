//! RPC backends against a local HTTP stub: Blockcypher, EVM JSON-RPC, Bitcoin Core
//!
//! The stub answers every JSON-RPC method both backends use, so one server
//! can stand in for the EVM node and the BTC wallet at once.

#![cfg(feature = "server")]

use alloy_primitives::U256;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use twinchain::network::BtcNetwork;
use twinchain::{
    rpc_providers, BalanceStatus, BlockcypherClient, BridgeConfig, BtcBalanceSource, ConnectionState, EvmProvider,
    EvmRpcProvider, EvmTransfer, ProviderError, Session, SessionConfig, WalletBridge,
};

const EVM_ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";
const BTC_ADDR: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
const REJECT_ADDR: &str = "0x000000000000000000000000000000000000dead";

async fn balance_route(Path((segment, address)): Path<(String, String)>) -> impl IntoResponse {
    if address == "limited" {
        return (StatusCode::TOO_MANY_REQUESTS, Json(json!({"error": "Limits reached."})));
    }
    let balance = if segment == "main" { 250_000 } else { 1 };
    (StatusCode::OK, Json(json!({"address": address, "balance": balance, "final_balance": balance})))
}

async fn rpc_route(Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let ok = |result: Value| Json(json!({"jsonrpc": "2.0", "id": id, "result": result}));
    match req["method"].as_str().unwrap_or_default() {
        "eth_requestAccounts" => ok(json!([EVM_ADDR])),
        "eth_chainId" => ok(json!("0xdf")),
        "eth_getBalance" => ok(json!("0x2bd72a24874000")),
        "eth_blockNumber" => ok(json!("0x65")),
        "eth_getTransactionReceipt" => ok(json!({
            "transactionHash": req["params"][0],
            "blockNumber": "0x64",
            "status": "0x1",
        })),
        "eth_sendTransaction" if req["params"][0]["to"] == REJECT_ADDR => Json(json!({
            "jsonrpc": "2.0", "id": req["id"], "error": {"code": 4001, "message": "User rejected the request."}
        })),
        "eth_sendTransaction" => ok(json!("0xfeed")),
        "listreceivedbyaddress" => ok(json!([{"address": BTC_ADDR, "amount": 0.0025}])),
        "getblockchaininfo" => ok(json!({"chain": "test", "blocks": 2_500_000})),
        "sendtoaddress" => ok(json!("f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16")),
        other => Json(json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": format!("Method not found: {}", other)}})),
    }
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/v1/btc/:segment/addrs/:address/balance", get(balance_route))
        .route("/rpc", post(rpc_route));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn blockcypher_balance_by_segment() {
    let base = spawn_stub().await;
    let client = BlockcypherClient::new(&base);

    assert_eq!(client.balance(BtcNetwork::Mainnet, BTC_ADDR).await, Ok(250_000));
    assert_eq!(client.balance(BtcNetwork::Testnet, BTC_ADDR).await, Ok(1));
}

#[tokio::test]
async fn blockcypher_429_is_rate_limited() {
    let base = spawn_stub().await;
    let client = BlockcypherClient::new(&base);

    let err = client.balance(BtcNetwork::Testnet, "limited").await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn evm_rpc_balance_and_chain_id() {
    let base = spawn_stub().await;
    let evm = EvmRpcProvider::new(format!("{}/rpc", base));

    assert_eq!(evm.balance(EVM_ADDR).await, Ok(U256::from(12_340_000_000_000_000u64)));
    assert_eq!(evm.chain_id().await, Ok(223));
    assert_eq!(evm.request_accounts().await, Ok(vec![EVM_ADDR.to_string()]));
}

#[tokio::test]
async fn evm_rpc_send_and_receipt() {
    let base = spawn_stub().await;
    let evm = EvmRpcProvider::new(format!("{}/rpc", base));
    let transfer = EvmTransfer { from: EVM_ADDR.into(), to: BTC_ADDR.into(), value: U256::from(1u64), data: vec![] };

    let hash = evm.send_transaction(&transfer).await.expect("send");
    assert_eq!(hash, "0xfeed");
    let receipt = evm.wait_for_receipt(&hash, 2).await.expect("receipt");
    assert!(receipt.success);
    assert_eq!(receipt.block_number, Some(100));
    assert_eq!(receipt.tx_hash, "0xfeed");
}

#[tokio::test]
async fn evm_rpc_user_rejection() {
    let base = spawn_stub().await;
    let evm = EvmRpcProvider::new(format!("{}/rpc", base));
    let transfer = EvmTransfer { from: EVM_ADDR.into(), to: REJECT_ADDR.into(), value: U256::from(1u64), data: vec![] };

    let err = evm.send_transaction(&transfer).await.unwrap_err();
    assert!(matches!(err, ProviderError::Rejected(_)));
}

#[tokio::test]
async fn rpc_bridge_requires_connect_before_btc_send() {
    let base = spawn_stub().await;
    let providers = rpc_providers(&BridgeConfig::default().with_evm_rpc(format!("{}/rpc", base)).with_btc_rpc(format!("{}/rpc", base)));

    assert_eq!(providers.bridge.send_btc(BTC_ADDR, 1).await, Err(ProviderError::NotConnected));

    let accounts = providers.bridge.connect().await.expect("connect");
    assert_eq!(accounts.evm.as_ref().map(|a| a.address.as_str()), Some(EVM_ADDR));
    assert_eq!(accounts.primary_btc().map(|a| a.address.as_str()), Some(BTC_ADDR));
    assert_eq!(providers.bridge.btc_network().await, Ok("testnet".to_string()));
    assert!(providers.bridge.send_btc(BTC_ADDR, 1).await.is_ok());

    providers.bridge.disconnect().await.expect("disconnect");
    assert_eq!(providers.bridge.send_btc(BTC_ADDR, 1).await, Err(ProviderError::NotConnected));
}

#[tokio::test]
async fn session_over_rpc_backends() {
    let base = spawn_stub().await;
    let rpc = format!("{}/rpc", base);
    let config = BridgeConfig::default().with_evm_rpc(&rpc).with_btc_rpc(&rpc).with_balance_api(&base);
    let session = Arc::new(Session::new(rpc_providers(&config), SessionConfig::default()));

    session.connect().await.expect("connect");
    let snap = session.snapshot().await;
    assert_eq!(snap.connection, ConnectionState::Connected);
    assert_eq!(snap.evm_network.expect("evm").display_name, "mainnet");
    assert_eq!(snap.btc_network.expect("btc").display_name, "testnet");
    assert_eq!(snap.evm_balance.amount.as_deref(), Some("0.012"));
    assert_eq!(snap.btc_balance.status, BalanceStatus::Ready);
    assert_eq!(snap.btc_balance.amount.as_deref(), Some("0.00000001"));
}
