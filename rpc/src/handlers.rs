//! RPC request handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_types::{Address, NetworkId, Weight};

use crate::error::RpcError;
use crate::server::RpcState;

/// Envelope shared by every endpoint: `code` 0 means success.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }

    pub fn error(code: i32, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProposalQuery {
    pub network: u32,
    pub proposal_id: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteResultItem {
    pub network: NetworkId,
    pub proposal_id: u64,
    pub option_id: u32,
    pub votes: Weight,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteHistoryItem {
    pub network: NetworkId,
    pub proposal_id: u64,
    pub option_id: u32,
    pub address: Address,
    pub votes: Weight,
}

fn parse_query(query: Result<Query<ProposalQuery>, QueryRejection>) -> Result<ProposalQuery, RpcError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| RpcError::InvalidRequest(e.body_text()))
}

// ── Health ───────────────────────────────────────────────────────────────

pub async fn health_check() -> Json<ApiResponse<()>> {
    Json(ApiResponse::success(None))
}

// ── Proposal ─────────────────────────────────────────────────────────────

pub async fn proposal_result(
    State(state): State<RpcState>,
    query: Result<Query<ProposalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<VoteResultItem>>>, RpcError> {
    let q = parse_query(query)?;
    let rows = state
        .store
        .get_results(NetworkId::new(q.network), q.proposal_id)?;
    let items = rows
        .into_iter()
        .map(|r| VoteResultItem {
            network: r.network,
            proposal_id: r.proposal_index,
            option_id: r.option_id,
            votes: r.votes,
        })
        .collect();
    Ok(Json(ApiResponse::success(Some(items))))
}

pub async fn proposal_history(
    State(state): State<RpcState>,
    query: Result<Query<ProposalQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<VoteHistoryItem>>>, RpcError> {
    let q = parse_query(query)?;
    let rows = state
        .store
        .get_history(NetworkId::new(q.network), q.proposal_id)?;
    let items = rows
        .into_iter()
        .map(|r| VoteHistoryItem {
            network: r.network,
            proposal_id: r.proposal_index,
            option_id: r.option_id,
            address: r.voter,
            votes: r.votes,
        })
        .collect();
    Ok(Json(ApiResponse::success(Some(items))))
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(state): State<RpcState>) -> Result<impl IntoResponse, RpcError> {
    use prometheus::Encoder;

    let Some(registry) = state.registry.as_ref() else {
        return Ok((StatusCode::NOT_FOUND, String::new()).into_response());
    };
    let encoder = prometheus::TextEncoder::new();
    let mut buf = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buf)
        .map_err(|e| RpcError::Server(e.to_string()))?;
    let body = String::from_utf8(buf).map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    )
        .into_response())
}
