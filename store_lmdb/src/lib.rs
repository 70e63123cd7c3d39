//! LMDB storage backend for the governance tally indexer.
//!
//! Implements all storage traits from `tally-store` using the `heed` LMDB
//! bindings. Each logical table maps to one LMDB database within a single
//! environment, so multi-table writes (proposal + seeded cursor, tally commit)
//! share one write transaction.

pub mod cursor;
pub mod environment;
pub mod error;
pub mod keys;
pub mod meta;
pub mod migration;
pub mod proposal;
pub mod tally;
pub mod vote;
pub mod write_batch;

pub use environment::LmdbStore;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
