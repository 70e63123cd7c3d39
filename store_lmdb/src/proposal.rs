//! LMDB implementation of ProposalStore.

use tally_store::{ProposalRecord, ProposalStore, StoreError};
use tally_types::NetworkId;

use crate::keys;
use crate::{LmdbError, LmdbStore};

impl ProposalStore for LmdbStore {
    fn insert_proposal(
        &self,
        proposal: &ProposalRecord,
        vote_cursor: &str,
        vote_cursor_start: u64,
    ) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        if batch.proposal_taken(proposal)? {
            return Err(LmdbError::Duplicate(format!(
                "proposal {} ({}) on network {}",
                proposal.proposal_index, proposal.content_id, proposal.network
            ))
            .into());
        }
        batch.put_proposal(proposal)?;
        batch.put_cursor(vote_cursor, vote_cursor_start)?;
        batch.commit()
    }

    fn proposal_exists(&self, content_id: &str) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .proposal_cids_db
            .get(&rtxn, content_id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn get_proposal(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<ProposalRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = keys::proposal_key(network, proposal_index);
        let val = self
            .proposals_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                LmdbError::NotFound(format!("proposal {proposal_index} on network {network}"))
            })?;
        let record: ProposalRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn list_proposals(&self, network: NetworkId) -> Result<Vec<ProposalRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = keys::network_prefix(network);
        let iter = self
            .proposals_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut proposals = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let record: ProposalRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            proposals.push(record);
        }
        Ok(proposals)
    }
}
