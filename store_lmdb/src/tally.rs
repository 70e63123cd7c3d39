//! LMDB implementation of TallyStore.
//!
//! A commit writes history rows, result rows and the closed proposal in a
//! single write transaction.

use tally_store::{
    StoreError, TallyCommit, TallyStore, VoteHistoryRecord, VoteResultRecord,
};
use tally_types::{NetworkId, ProposalStatus};

use crate::keys;
use crate::{LmdbError, LmdbStore};

impl TallyStore for LmdbStore {
    fn commit_tally(&self, commit: &TallyCommit) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;

        let mut proposal = batch.get_proposal(commit.network, commit.proposal_index)?;
        if !proposal.status.is_open() {
            return Err(LmdbError::Duplicate(format!(
                "proposal {} on network {} is already closed",
                commit.proposal_index, commit.network
            ))
            .into());
        }

        for row in &commit.history {
            batch.put_history(row)?;
        }
        for row in &commit.results {
            batch.put_result(row)?;
        }

        proposal.status = ProposalStatus::Closed;
        batch.put_proposal(&proposal)?;
        batch.commit()
    }

    fn get_results(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteResultRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = keys::proposal_key(network, proposal_index);
        let iter = self
            .results_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut rows = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            rows.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(rows)
    }

    fn get_history(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteHistoryRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = keys::proposal_key(network, proposal_index);
        let iter = self
            .history_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut rows = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            rows.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::{ProposalRecord, ProposalStore};
    use tally_types::{Address, Timestamp, Weight};

    const NET: NetworkId = NetworkId::new(314);

    fn temp_store() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), 8, 10 * 1024 * 1024).expect("open");
        (dir, store)
    }

    fn seed_proposal(store: &LmdbStore, index: u64) {
        let record = ProposalRecord {
            network: NET,
            proposal_index: index,
            content_id: format!("cid-{index}"),
            proposal_type: 1,
            creator: Address::ZERO,
            expiry: Timestamp::new(10),
            vote_count: 2,
            status: ProposalStatus::Open,
        };
        store
            .insert_proposal(&record, &format!("vote_start:314:{index}"), 1)
            .unwrap();
    }

    fn commit(index: u64) -> TallyCommit {
        let x = Address::new([0xaa; 20]);
        let y = Address::new([0xbb; 20]);
        TallyCommit {
            network: NET,
            proposal_index: index,
            history: vec![
                VoteHistoryRecord { network: NET, proposal_index: index, option_id: 0, voter: x, votes: Weight::new(50) },
                VoteHistoryRecord { network: NET, proposal_index: index, option_id: 1, voter: y, votes: Weight::new(10) },
            ],
            results: vec![
                VoteResultRecord { network: NET, proposal_index: index, option_id: 1, votes: Weight::new(10) },
                VoteResultRecord { network: NET, proposal_index: index, option_id: 0, votes: Weight::new(50) },
            ],
        }
    }

    #[test]
    fn commit_closes_and_persists_rows() {
        let (_dir, store) = temp_store();
        seed_proposal(&store, 1);
        store.commit_tally(&commit(1)).unwrap();

        assert!(!store.get_proposal(NET, 1).unwrap().status.is_open());
        let results = store.get_results(NET, 1).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].option_id, 0);
        assert_eq!(results[0].votes, Weight::new(50));
        assert_eq!(results[1].votes, Weight::new(10));
        assert_eq!(store.get_history(NET, 1).unwrap().len(), 2);
    }

    #[test]
    fn second_commit_is_refused() {
        let (_dir, store) = temp_store();
        seed_proposal(&store, 1);
        store.commit_tally(&commit(1)).unwrap();
        let err = store.commit_tally(&commit(1)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.get_history(NET, 1).unwrap().len(), 2);
    }

    #[test]
    fn unknown_proposal_writes_nothing() {
        let (_dir, store) = temp_store();
        let err = store.commit_tally(&commit(9)).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_results(NET, 9).unwrap().is_empty());
        assert!(store.get_history(NET, 9).unwrap().is_empty());
    }

    #[test]
    fn empty_tally_still_closes() {
        let (_dir, store) = temp_store();
        seed_proposal(&store, 3);
        store
            .commit_tally(&TallyCommit { network: NET, proposal_index: 3, history: vec![], results: vec![] })
            .unwrap();
        assert!(!store.get_proposal(NET, 3).unwrap().status.is_open());
    }

    #[test]
    fn map_full_mid_history_rolls_back_everything() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), 8, 1024 * 1024).expect("open");
        seed_proposal(&store, 1);

        // Far more history than a 1 MiB map can hold.
        let history: Vec<VoteHistoryRecord> = (0..40_000u32)
            .map(|i| {
                let mut voter = [0u8; 20];
                voter[..4].copy_from_slice(&i.to_be_bytes());
                VoteHistoryRecord {
                    network: NET,
                    proposal_index: 1,
                    option_id: 0,
                    voter: Address::new(voter),
                    votes: Weight::new(1),
                }
            })
            .collect();
        let oversized = TallyCommit {
            network: NET,
            proposal_index: 1,
            history,
            results: vec![VoteResultRecord { network: NET, proposal_index: 1, option_id: 0, votes: Weight::new(40_000) }],
        };

        assert!(store.commit_tally(&oversized).is_err());
        assert!(store.get_history(NET, 1).unwrap().is_empty());
        assert!(store.get_results(NET, 1).unwrap().is_empty());
        assert!(store.get_proposal(NET, 1).unwrap().status.is_open());

        // The environment stays usable for a commit that fits.
        store.commit_tally(&commit(1)).unwrap();
        assert_eq!(store.get_history(NET, 1).unwrap().len(), 2);
    }
}
