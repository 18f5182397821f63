//! HTTP routes over a shared `Session`

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::{get, post, put}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::balance::SyncOutcome;
use crate::core::paths::routes;
use crate::dispatch::TransactionResult;
use crate::error::SessionError;
use crate::session::{Session, SessionSnapshot};

#[derive(Clone)]
pub struct SessionState { pub session: Arc<Session>, pub app_name: String }

impl SessionState {
    pub fn new(session: Arc<Session>, app_name: impl Into<String>) -> Self {
        Self { session, app_name: app_name.into() }
    }
}

#[derive(Deserialize)]
pub struct InputRequest { value: String }

#[derive(Serialize)]
pub struct RefreshResponse { outcome: &'static str }

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn create_router(session: Arc<Session>) -> Router { create_router_with_name(session, "twinchain") }

pub fn create_router_with_name(session: Arc<Session>, app_name: &str) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health))
        .route(routes::SESSION, get(snapshot))
        .route(routes::CONNECT, post(connect))
        .route(routes::DISCONNECT, post(disconnect))
        .route(routes::REFRESH, post(refresh))
        .route(routes::EVM_INPUT, put(set_evm_input))
        .route(routes::BTC_INPUT, put(set_btc_input))
        .route(routes::EVM_TX, post(submit_evm))
        .route(routes::BTC_TX, post(submit_btc))
        .route(routes::COPY, post(copy))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(SessionState::new(session, app_name))
}

fn session_error(err: SessionError) -> ApiError {
    let status = match err {
        SessionError::Connection(_) => StatusCode::BAD_GATEWAY,
        SessionError::Busy(_) | SessionError::NotConnected => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

async fn health(State(s): State<SessionState>) -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": s.app_name}))
}

async fn snapshot(State(s): State<SessionState>) -> Json<SessionSnapshot> {
    Json(s.session.snapshot().await)
}

async fn connect(State(s): State<SessionState>) -> Result<Json<SessionSnapshot>, ApiError> {
    s.session.connect().await.map_err(session_error)?;
    Ok(Json(s.session.snapshot().await))
}

async fn disconnect(State(s): State<SessionState>) -> Result<Json<SessionSnapshot>, ApiError> {
    s.session.disconnect().await.map_err(session_error)?;
    Ok(Json(s.session.snapshot().await))
}

async fn refresh(State(s): State<SessionState>) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = match s.session.refresh().await.map_err(session_error)? {
        SyncOutcome::Unchanged => "unchanged",
        SyncOutcome::MissingAccounts => "missing_accounts",
        SyncOutcome::Superseded => "superseded",
        SyncOutcome::Synced { .. } => "synced",
    };
    Ok(Json(RefreshResponse { outcome }))
}

async fn set_evm_input(State(s): State<SessionState>, Json(req): Json<InputRequest>) -> StatusCode {
    s.session.set_evm_address_input(req.value).await;
    StatusCode::NO_CONTENT
}

async fn set_btc_input(State(s): State<SessionState>, Json(req): Json<InputRequest>) -> StatusCode {
    s.session.set_btc_address_input(req.value).await;
    StatusCode::NO_CONTENT
}

async fn submit_evm(State(s): State<SessionState>) -> Json<TransactionResult> {
    Json(s.session.submit_evm_tx().await)
}

async fn submit_btc(State(s): State<SessionState>) -> Json<TransactionResult> {
    Json(s.session.submit_btc_tx().await)
}

async fn copy(State(s): State<SessionState>, Json(req): Json<InputRequest>) -> StatusCode {
    s.session.copy_address(req.value).await;
    StatusCode::NO_CONTENT
}
