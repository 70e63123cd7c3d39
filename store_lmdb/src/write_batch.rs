//! Write batching: groups several table writes into a single LMDB write
//! transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = store.write_batch()?;
//! batch.put_history(&row)?;
//! batch.put_result(&result)?;
//! batch.put_proposal(&closed)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use tally_store::cursor::encode_cursor;
use tally_store::{ProposalRecord, StoreError, VoteHistoryRecord, VoteResultRecord};
use tally_types::NetworkId;

use crate::environment::LmdbStore;
use crate::keys;
use crate::LmdbError;

/// A write batch over one LMDB write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    store: &'a LmdbStore,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(store: &'a LmdbStore) -> Result<Self, StoreError> {
        let txn = store.env.write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, store })
    }

    // ── Proposal operations ─────────────────────────────────────────────

    /// Read a proposal inside this transaction.
    pub fn get_proposal(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<ProposalRecord, StoreError> {
        let key = keys::proposal_key(network, proposal_index);
        let val = self
            .store
            .proposals_db
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                LmdbError::NotFound(format!("proposal {proposal_index} on network {network}"))
            })?;
        let record: ProposalRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    /// Put a proposal row and its content-id index entry.
    pub fn put_proposal(&mut self, proposal: &ProposalRecord) -> Result<(), StoreError> {
        let key = keys::proposal_key(proposal.network, proposal.proposal_index);
        let bytes = bincode::serialize(proposal).map_err(LmdbError::from)?;
        self.store
            .proposals_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.store
            .proposal_cids_db
            .put(&mut self.txn, proposal.content_id.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Whether a content identifier or proposal slot is already taken.
    pub fn proposal_taken(&self, proposal: &ProposalRecord) -> Result<bool, StoreError> {
        let cid_taken = self
            .store
            .proposal_cids_db
            .get(&self.txn, proposal.content_id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        let key = keys::proposal_key(proposal.network, proposal.proposal_index);
        let slot_taken = self
            .store
            .proposals_db
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?
            .is_some();
        Ok(cid_taken || slot_taken)
    }

    // ── Cursor operations ───────────────────────────────────────────────

    pub fn put_cursor(&mut self, name: &str, value: u64) -> Result<(), StoreError> {
        self.store
            .cursors_db
            .put(&mut self.txn, name.as_bytes(), encode_cursor(value).as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Tally operations ────────────────────────────────────────────────

    pub fn put_history(&mut self, row: &VoteHistoryRecord) -> Result<(), StoreError> {
        let key = keys::history_key(row.network, row.proposal_index, row.option_id, &row.voter);
        let bytes = bincode::serialize(row).map_err(LmdbError::from)?;
        self.store
            .history_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    pub fn put_result(&mut self, row: &VoteResultRecord) -> Result<(), StoreError> {
        let key = keys::result_key(row.network, row.proposal_index, row.option_id);
        let bytes = bincode::serialize(row).map_err(LmdbError::from)?;
        self.store
            .results_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
