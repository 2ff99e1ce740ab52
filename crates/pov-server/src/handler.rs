use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use pov_ledger::{parse_exact, HashChain};
use pov_types::Block;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};

/// Shared handler state: the one ledger handle opened at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub ledger: HashChain,
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn api_root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Proof of Perspective API!" }))
}

/// `GET /api/ledger`: the whole chain, genesis first.
pub async fn list_ledger(State(state): State<AppState>) -> ServerResult<Json<Vec<Block>>> {
    let blocks = state.ledger.read_all().collect_all().await?;
    Ok(Json(blocks))
}

/// `POST /api/ledger/add`: append the JSON body as an event payload.
pub async fn add_entry(
    State(state): State<AppState>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<Block>)> {
    let payload = if body.is_empty() {
        Value::Null
    } else {
        parse_exact(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?
    };
    if is_empty_payload(&payload) {
        return Err(ServerError::BadRequest("request body is empty".into()));
    }

    let block = state.ledger.append(payload).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub first_invalid_index: Option<u64>,
    pub length: u64,
    pub blocks_checked: u64,
    pub fault: Option<String>,
}

/// `GET /api/ledger/verify`: walk the chain and report the first fault.
pub async fn verify_ledger(State(state): State<AppState>) -> ServerResult<Json<VerifyResponse>> {
    let report = state.ledger.audit().await?;
    let length = state.ledger.block_count().await?;
    Ok(Json(VerifyResponse {
        valid: report.is_valid(),
        first_invalid_index: report.fault.as_ref().map(|f| f.index),
        length,
        blocks_checked: report.blocks_checked,
        fault: report.fault.map(|f| format!("{:?}", f.kind)),
    }))
}

/// Null, `false`, zero, and empty strings or containers carry no event.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
