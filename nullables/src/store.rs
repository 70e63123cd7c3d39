//! Nullable store: thread-safe in-memory storage for testing.
//!
//! All tables live behind one mutex, so every trait method is atomic with
//! respect to the others, matching one LMDB write transaction.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tally_store::cursor::CursorStore;
use tally_store::{
    ProposalRecord, ProposalStore, StoreError, TallyCommit, TallyStore, VoteHistoryRecord,
    VoteRecord, VoteResultRecord, VoteStore, VoteUpsert,
};
use tally_types::{Address, NetworkId, ProposalStatus};

#[derive(Clone, Default)]
struct Tables {
    cursors: HashMap<String, u64>,
    proposals: BTreeMap<(NetworkId, u64), ProposalRecord>,
    content_ids: HashSet<String>,
    votes: BTreeMap<(NetworkId, u64, Address), VoteRecord>,
    history: BTreeMap<(NetworkId, u64, u32, Address), VoteHistoryRecord>,
    results: BTreeMap<(NetworkId, u64, u32), VoteResultRecord>,
}

/// An in-memory implementation of every governance store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    fail_tally_commits: AtomicBool,
    fail_vote_writes: AtomicBool,
    fail_proposal_writes: AtomicBool,
    fail_cursor_writes: AtomicBool,
}

fn injected(what: &str) -> StoreError {
    StoreError::Backend(format!("injected {what} failure"))
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make tally commits fail after history rows are staged and before the
    /// proposal is closed. Staged rows are discarded.
    pub fn fail_tally_commits(&self, fail: bool) {
        self.fail_tally_commits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_vote_writes(&self, fail: bool) {
        self.fail_vote_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_proposal_writes(&self, fail: bool) {
        self.fail_proposal_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_cursor_writes(&self, fail: bool) {
        self.fail_cursor_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of proposal rows across every network.
    pub fn total_proposals(&self) -> usize {
        self.tables.lock().unwrap().proposals.len()
    }
}

impl CursorStore for NullStore {
    fn get_cursor(&self, name: &str) -> Result<u64, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .cursors
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("cursor '{name}'")))
    }

    fn put_cursor(&self, name: &str, value: u64) -> Result<(), StoreError> {
        if self.fail_cursor_writes.load(Ordering::SeqCst) {
            return Err(injected("cursor write"));
        }
        self.tables
            .lock()
            .unwrap()
            .cursors
            .insert(name.to_string(), value);
        Ok(())
    }
}

impl ProposalStore for NullStore {
    fn insert_proposal(
        &self,
        proposal: &ProposalRecord,
        vote_cursor: &str,
        vote_cursor_start: u64,
    ) -> Result<(), StoreError> {
        if self.fail_proposal_writes.load(Ordering::SeqCst) {
            return Err(injected("proposal write"));
        }
        let mut tables = self.tables.lock().unwrap();
        let key = (proposal.network, proposal.proposal_index);
        if tables.content_ids.contains(&proposal.content_id) || tables.proposals.contains_key(&key)
        {
            return Err(StoreError::Duplicate(format!(
                "proposal {} ({})",
                proposal.proposal_index, proposal.content_id
            )));
        }
        tables.content_ids.insert(proposal.content_id.clone());
        tables.proposals.insert(key, proposal.clone());
        tables
            .cursors
            .insert(vote_cursor.to_string(), vote_cursor_start);
        Ok(())
    }

    fn proposal_exists(&self, content_id: &str) -> Result<bool, StoreError> {
        Ok(self.tables.lock().unwrap().content_ids.contains(content_id))
    }

    fn get_proposal(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<ProposalRecord, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .proposals
            .get(&(network, proposal_index))
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("proposal {proposal_index} on network {network}"))
            })
    }

    fn list_proposals(&self, network: NetworkId) -> Result<Vec<ProposalRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .proposals
            .range((network, 0)..=(network, u64::MAX))
            .map(|(_, p)| p.clone())
            .collect())
    }
}

impl VoteStore for NullStore {
    fn upsert_vote(&self, vote: &VoteRecord) -> Result<VoteUpsert, StoreError> {
        if self.fail_vote_writes.load(Ordering::SeqCst) {
            return Err(injected("vote write"));
        }
        let mut tables = self.tables.lock().unwrap();
        let key = (vote.network, vote.proposal_index, vote.voter);
        let outcome = match tables.votes.get(&key) {
            None => VoteUpsert::Inserted,
            Some(existing) if existing.payload == vote.payload => VoteUpsert::Unchanged,
            Some(_) => VoteUpsert::Updated,
        };
        tables.votes.insert(key, vote.clone());
        Ok(outcome)
    }

    fn get_votes(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .votes
            .iter()
            .filter(|((n, p, _), _)| *n == network && *p == proposal_index)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

impl TallyStore for NullStore {
    fn commit_tally(&self, commit: &TallyCommit) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let key = (commit.network, commit.proposal_index);

        let mut staged = tables.clone();
        let proposal = staged.proposals.get_mut(&key).ok_or_else(|| {
            StoreError::NotFound(format!(
                "proposal {} on network {}",
                commit.proposal_index, commit.network
            ))
        })?;
        if !proposal.status.is_open() {
            return Err(StoreError::Duplicate(format!(
                "proposal {} already closed",
                commit.proposal_index
            )));
        }
        proposal.status = ProposalStatus::Closed;

        for row in &commit.history {
            staged.history.insert(
                (row.network, row.proposal_index, row.option_id, row.voter),
                row.clone(),
            );
        }
        if self.fail_tally_commits.load(Ordering::SeqCst) {
            return Err(injected("tally commit"));
        }
        for row in &commit.results {
            staged
                .results
                .insert((row.network, row.proposal_index, row.option_id), row.clone());
        }

        *tables = staged;
        Ok(())
    }

    fn get_results(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteResultRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .results
            .range((network, proposal_index, 0)..=(network, proposal_index, u32::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn get_history(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteHistoryRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|((n, p, _, _), _)| *n == network && *p == proposal_index)
            .map(|(_, h)| h.clone())
            .collect())
    }
}
