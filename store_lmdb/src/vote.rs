//! LMDB implementation of VoteStore.

use tally_store::{StoreError, VoteRecord, VoteStore, VoteUpsert};
use tally_types::NetworkId;

use crate::keys;
use crate::{LmdbError, LmdbStore};

impl VoteStore for LmdbStore {
    fn upsert_vote(&self, vote: &VoteRecord) -> Result<VoteUpsert, StoreError> {
        let key = keys::vote_key(vote.network, vote.proposal_index, &vote.voter);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let outcome = match self.votes_db.get(&wtxn, &key).map_err(LmdbError::from)? {
            None => VoteUpsert::Inserted,
            Some(bytes) => {
                let existing: VoteRecord =
                    bincode::deserialize(bytes).map_err(LmdbError::from)?;
                if existing.payload == vote.payload {
                    VoteUpsert::Unchanged
                } else {
                    VoteUpsert::Updated
                }
            }
        };

        if outcome != VoteUpsert::Unchanged {
            let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
            self.votes_db
                .put(&mut wtxn, &key, &bytes)
                .map_err(LmdbError::from)?;
            wtxn.commit().map_err(LmdbError::from)?;
        }
        Ok(outcome)
    }

    fn get_votes(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = keys::proposal_key(network, proposal_index);
        let iter = self
            .votes_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut votes = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let record: VoteRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            votes.push(record);
        }
        Ok(votes)
    }
}
