use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] tally_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] tally_store_lmdb::LmdbError),

    #[error("governance error: {0}")]
    Governance(#[from] tally_governance::GovernanceError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC server error: {0}")]
    Rpc(String),

    #[error("node already started")]
    AlreadyStarted,

    #[error("shutdown timeout")]
    ShutdownTimeout,

    #[error("{0}")]
    Other(String),
}
