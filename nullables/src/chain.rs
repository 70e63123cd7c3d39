//! Nullable chain: scripted contract state with injectable failures.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tally_chain::{ChainError, ChainProposal, ChainReader, ChainVote};
use tally_types::{Address, Timestamp, TokenAmount};

#[derive(Default)]
struct ChainState {
    latest: u64,
    proposals: HashMap<u64, ChainProposal>,
    votes: HashMap<(u64, u64), ChainVote>,
    balances: HashMap<Address, TokenAmount>,
    timestamp: Option<Timestamp>,
    /// Remaining failures per proposal slot.
    failing_proposals: HashMap<u64, u32>,
    /// Remaining failures per `(proposal, vote)` slot.
    failing_votes: HashMap<(u64, u64), u32>,
    failing_balances: Vec<Address>,
    fail_latest: bool,
    proposal_fetches: Vec<u64>,
    balance_reads: u64,
}

/// A scripted [`ChainReader`].
///
/// Unscripted proposal and vote slots read as empty (no content id, no
/// payload), like a slot the contract has not populated. Unscripted balances
/// are zero. The timestamp read fails until one is set.
#[derive(Default)]
pub struct NullChain {
    state: Mutex<ChainState>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A populated proposal slot.
    pub fn proposal_with(cid: &str, expiry: u64, vote_count: u64) -> ChainProposal {
        ChainProposal {
            content_id: cid.to_string(),
            proposal_type: 1,
            creator: Address::new([0xc0; 20]),
            expiry: Timestamp::new(expiry),
            vote_count,
        }
    }

    pub fn set_latest(&self, index: u64) {
        self.state.lock().unwrap().latest = index;
    }

    /// Script a proposal slot and raise `latest` to cover it.
    pub fn put_proposal(&self, index: u64, proposal: ChainProposal) {
        let mut state = self.state.lock().unwrap();
        state.latest = state.latest.max(index);
        state.proposals.insert(index, proposal);
    }

    /// Script a vote slot and raise the proposal's vote count to cover it.
    pub fn put_vote(&self, proposal: u64, index: u64, voter: Address, payload: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(p) = state.proposals.get_mut(&proposal) {
            p.vote_count = p.vote_count.max(index);
        }
        state.votes.insert(
            (proposal, index),
            ChainVote {
                voter,
                payload: payload.to_string(),
            },
        );
    }

    pub fn set_balance(&self, account: Address, raw: u128) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(account, TokenAmount::new(raw));
    }

    pub fn set_timestamp(&self, now: Option<u64>) {
        self.state.lock().unwrap().timestamp = now.map(Timestamp::new);
    }

    /// Make the next `times` fetches of a proposal slot fail.
    pub fn fail_proposal(&self, index: u64, times: u32) {
        self.state
            .lock()
            .unwrap()
            .failing_proposals
            .insert(index, times);
    }

    /// Make the next `times` fetches of a vote slot fail.
    pub fn fail_vote(&self, proposal: u64, index: u64, times: u32) {
        self.state
            .lock()
            .unwrap()
            .failing_votes
            .insert((proposal, index), times);
    }

    pub fn fail_balance(&self, account: Address) {
        self.state.lock().unwrap().failing_balances.push(account);
    }

    pub fn fail_latest(&self, fail: bool) {
        self.state.lock().unwrap().fail_latest = fail;
    }

    /// Every proposal slot fetched so far, in call order.
    pub fn proposal_fetches(&self) -> Vec<u64> {
        self.state.lock().unwrap().proposal_fetches.clone()
    }

    pub fn balance_reads(&self) -> u64 {
        self.state.lock().unwrap().balance_reads
    }
}

fn take_failure<K: std::hash::Hash + Eq>(failures: &mut HashMap<K, u32>, key: &K) -> bool {
    match failures.get_mut(key) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

#[async_trait]
impl ChainReader for NullChain {
    async fn latest_proposal_index(&self) -> Result<u64, ChainError> {
        let state = self.state.lock().unwrap();
        if state.fail_latest {
            return Err(ChainError::Transport("injected latest index failure".into()));
        }
        Ok(state.latest)
    }

    async fn proposal(&self, index: u64) -> Result<ChainProposal, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.proposal_fetches.push(index);
        if take_failure(&mut state.failing_proposals, &index) {
            return Err(ChainError::Transport(format!(
                "injected failure fetching proposal {index}"
            )));
        }
        Ok(state.proposals.get(&index).cloned().unwrap_or(ChainProposal {
            content_id: String::new(),
            proposal_type: 0,
            creator: Address::ZERO,
            expiry: Timestamp::EPOCH,
            vote_count: 0,
        }))
    }

    async fn vote(&self, proposal_index: u64, vote_index: u64) -> Result<ChainVote, ChainError> {
        let mut state = self.state.lock().unwrap();
        let key = (proposal_index, vote_index);
        if take_failure(&mut state.failing_votes, &key) {
            return Err(ChainError::Transport(format!(
                "injected failure fetching vote {vote_index} of proposal {proposal_index}"
            )));
        }
        Ok(state.votes.get(&key).cloned().unwrap_or(ChainVote {
            voter: Address::ZERO,
            payload: String::new(),
        }))
    }

    async fn balance_of(&self, account: &Address) -> Result<TokenAmount, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.balance_reads += 1;
        if state.failing_balances.contains(account) {
            return Err(ChainError::Rpc {
                code: -32000,
                message: format!("injected balance failure for {account}"),
            });
        }
        Ok(state.balances.get(account).copied().unwrap_or_default())
    }

    async fn current_timestamp(&self) -> Result<Timestamp, ChainError> {
        self.state
            .lock()
            .unwrap()
            .timestamp
            .ok_or_else(|| ChainError::Transport("injected timestamp failure".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unscripted_slots_read_empty() {
        let chain = NullChain::new();
        assert!(chain.proposal(3).await.unwrap().content_id.is_empty());
        assert!(chain.vote(3, 1).await.unwrap().payload.is_empty());
    }

    #[tokio::test]
    async fn failures_are_consumed() {
        let chain = NullChain::new();
        chain.put_proposal(1, NullChain::proposal_with("a", 10, 0));
        chain.fail_proposal(1, 1);
        assert!(chain.proposal(1).await.is_err());
        assert_eq!(chain.proposal(1).await.unwrap().content_id, "a");
        assert_eq!(chain.proposal_fetches(), vec![1, 1]);
    }

    #[tokio::test]
    async fn put_vote_raises_vote_count() {
        let chain = NullChain::new();
        chain.put_proposal(1, NullChain::proposal_with("a", 10, 0));
        chain.put_vote(1, 2, Address::new([1; 20]), "[[0,100]]");
        assert_eq!(chain.proposal(1).await.unwrap().vote_count, 2);
    }
}
