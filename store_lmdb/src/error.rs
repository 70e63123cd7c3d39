use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("migration error: {0}")]
    Migration(String),

    #[error("meta store error: {0}")]
    Meta(#[from] tally_store::StoreError),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for LmdbError {
    fn from(e: std::io::Error) -> Self {
        LmdbError::Io(e.to_string())
    }
}

impl From<LmdbError> for tally_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(key) => tally_store::StoreError::NotFound(key),
            LmdbError::Duplicate(key) => tally_store::StoreError::Duplicate(key),
            LmdbError::Serialization(msg) => tally_store::StoreError::Serialization(msg),
            LmdbError::Meta(inner) => inner,
            other => tally_store::StoreError::Backend(other.to_string()),
        }
    }
}
