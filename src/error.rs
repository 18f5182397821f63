//! Error taxonomy: adapter failures and session rejections.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures produced by the chain provider adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("rejected by wallet: {0}")]
    Rejected(String),

    #[error("submission failed: {0}")]
    Submit(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("wallet not connected")]
    NotConnected,
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited)
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ProviderError::Rejected(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            ProviderError::RateLimited
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Rpc(err.to_string())
        }
    }
}

/// Session state machine rejections.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("wallet connection failed: {0}")]
    Connection(#[source] ProviderError),

    #[error("session is already {0}")]
    Busy(&'static str),

    #[error("session is not connected")]
    NotConnected,
}

/// Why a transaction attempt failed. Carried in `TransactionResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxErrorKind {
    EmptyDestination,
    NotConnected,
    Rejected,
    SubmitFailed,
    Reverted,
    ConfirmationTimeout,
}

impl TxErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxErrorKind::EmptyDestination => "empty_destination",
            TxErrorKind::NotConnected => "not_connected",
            TxErrorKind::Rejected => "rejected",
            TxErrorKind::SubmitFailed => "submit_failed",
            TxErrorKind::Reverted => "reverted",
            TxErrorKind::ConfirmationTimeout => "confirmation_timeout",
        }
    }
}

impl From<&ProviderError> for TxErrorKind {
    fn from(err: &ProviderError) -> Self {
        match err {
            ProviderError::Rejected(_) => TxErrorKind::Rejected,
            ProviderError::NotConnected => TxErrorKind::NotConnected,
            _ => TxErrorKind::SubmitFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display() {
        assert_eq!(ProviderError::RateLimited.to_string(), "rate limited by upstream");
        assert_eq!(ProviderError::Rpc("timeout".into()).to_string(), "rpc error: timeout");
    }

    #[test]
    fn session_error_wraps_connection_failure() {
        let err = SessionError::Connection(ProviderError::Connection("user closed modal".into()));
        assert_eq!(err.to_string(), "wallet connection failed: connection failed: user closed modal");
    }

    #[test]
    fn rejection_maps_to_rejected_kind() {
        let kind = TxErrorKind::from(&ProviderError::Rejected("user denied".into()));
        assert_eq!(kind, TxErrorKind::Rejected);
        assert_eq!(TxErrorKind::from(&ProviderError::Rpc("x".into())), TxErrorKind::SubmitFailed);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&TxErrorKind::ConfirmationTimeout).unwrap();
        assert_eq!(json, "\"confirmation_timeout\"");
        assert_eq!(TxErrorKind::ConfirmationTimeout.as_str(), "confirmation_timeout");
    }
}
