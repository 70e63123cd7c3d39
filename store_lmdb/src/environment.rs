//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tally_store::StoreError;

use crate::migration::Migrator;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Number of named databases this store creates.
pub const MAX_DBS: u32 = 8;

/// Default map size (1 GiB).
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// The LMDB environment and every database handle.
///
/// Implements all `tally-store` traits, so one `Arc<LmdbStore>` can be
/// handed to every network task.
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) cursors_db: Database<Bytes, Bytes>,
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    /// content id -> proposal key
    pub(crate) proposal_cids_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) history_db: Database<Bytes, Bytes>,
    pub(crate) results_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at `path` and run schema migrations.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process per path; the
        // node never opens the same directory twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        let cursors_db = env.create_database(&mut wtxn, Some("cursors"))?;
        let proposals_db = env.create_database(&mut wtxn, Some("proposals"))?;
        let proposal_cids_db = env.create_database(&mut wtxn, Some("proposal_cids"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let history_db = env.create_database(&mut wtxn, Some("vote_history"))?;
        let results_db = env.create_database(&mut wtxn, Some("vote_results"))?;
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            meta_db,
            cursors_db,
            proposals_db,
            proposal_cids_db,
            votes_db,
            history_db,
            results_db,
        };

        Migrator::run(&store)?;
        tracing::info!(path = %path.display(), map_size, "LMDB store opened");
        Ok(store)
    }

    /// Open with the default database count and map size.
    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, MAX_DBS, DEFAULT_MAP_SIZE)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Begin a write batch. Dropping it without [`WriteBatch::commit`] aborts.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }
}
