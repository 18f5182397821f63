//! Minimal JSON-RPC 2.0 client over reqwest.
//!
//! Shared by the Ethereum and Bitcoin Core backends. HTTP 429 maps to
//! `RateLimited`; EIP-1193 code 4001 maps to `Rejected`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::error::ProviderError;

/// EIP-1193 "user rejected the request".
const USER_REJECTED: i64 = 4001;

#[derive(Debug, Clone)]
struct BasicAuth { user: String, pass: String }

#[derive(Debug, Deserialize)]
struct RpcErrorBody { code: i64, message: String }

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    auth: Option<BasicAuth>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into(), auth: None, next_id: AtomicU64::new(1) }
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth { user: user.into(), pass: pass.into() });
        self
    }

    pub fn url(&self) -> &str { &self.url }

    /// Call `method`; a `null` result is an error.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
        let value = self.call_raw(method, params).await?;
        if value.is_null() {
            return Err(ProviderError::Malformed(format!("{}: null result", method)));
        }
        serde_json::from_value(value).map_err(|e| ProviderError::Malformed(format!("{}: {}", method, e)))
    }

    /// Call `method`; a `null` result comes back as `None`.
    pub async fn call_optional<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, ProviderError> {
        let value = self.call_raw(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ProviderError::Malformed(format!("{}: {}", method, e)))
    }

    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        debug!(method, id, url = %self.url, "json-rpc request");

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(auth) = &self.auth {
            request = request.basic_auth(&auth.user, Some(&auth.pass));
        }
        let response = request.send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        // Bitcoin Core answers RPC errors with HTTP 500 and a JSON body, so only
        // bail on non-JSON failures.
        let text = response.text().await?;
        let parsed: RpcResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(ProviderError::Rpc(format!("{}: HTTP {}", method, status))),
            Err(e) => return Err(ProviderError::Malformed(format!("{}: {}", method, e))),
        };

        if let Some(err) = parsed.error {
            return Err(if err.code == USER_REJECTED {
                ProviderError::Rejected(err.message)
            } else {
                ProviderError::Rpc(format!("{} ({}): {}", method, err.code, err.message))
            });
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}
