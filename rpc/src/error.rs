//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::handlers::ApiResponse;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Store(_) | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tally_store::StoreError> for RpcError {
    fn from(e: tally_store::StoreError) -> Self {
        RpcError::Store(e.to_string())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ApiResponse::<()>::error(status.as_u16() as i32, self.to_string());
        (status, Json(body)).into_response()
    }
}
