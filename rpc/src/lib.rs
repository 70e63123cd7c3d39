//! HTTP read API for the governance tally indexer.
//!
//! Provides endpoints under `/power_voting/api` for:
//! - Liveness (`/health_check`)
//! - Tallied results of a proposal (`/proposal/result`)
//! - Per-voter audit rows of a proposal (`/proposal/history`)
//!
//! plus an optional Prometheus scrape endpoint at `/metrics`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState, API_PREFIX};
