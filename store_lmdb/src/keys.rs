//! Binary composite key layouts.
//!
//! Every key starts with the big-endian network id followed by the
//! big-endian proposal index, so a prefix scan over `network` or
//! `network ++ proposal` returns rows in proposal-index order.

use tally_types::{Address, NetworkId};

pub const NETWORK_PREFIX_LEN: usize = 4;
pub const PROPOSAL_PREFIX_LEN: usize = 12;

/// `network(4) ++ proposal_index(8)`.
pub fn proposal_key(network: NetworkId, proposal_index: u64) -> [u8; PROPOSAL_PREFIX_LEN] {
    let mut key = [0u8; PROPOSAL_PREFIX_LEN];
    key[..4].copy_from_slice(&network.to_be_bytes());
    key[4..].copy_from_slice(&proposal_index.to_be_bytes());
    key
}

/// `network(4)`.
pub fn network_prefix(network: NetworkId) -> [u8; NETWORK_PREFIX_LEN] {
    network.to_be_bytes()
}

/// `network ++ proposal_index ++ voter(20)`.
pub fn vote_key(network: NetworkId, proposal_index: u64, voter: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(PROPOSAL_PREFIX_LEN + 20);
    key.extend_from_slice(&proposal_key(network, proposal_index));
    key.extend_from_slice(voter.as_bytes());
    key
}

/// `network ++ proposal_index ++ option(4)`.
pub fn result_key(network: NetworkId, proposal_index: u64, option_id: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(PROPOSAL_PREFIX_LEN + 4);
    key.extend_from_slice(&proposal_key(network, proposal_index));
    key.extend_from_slice(&option_id.to_be_bytes());
    key
}

/// `network ++ proposal_index ++ option(4) ++ voter(20)`.
pub fn history_key(
    network: NetworkId,
    proposal_index: u64,
    option_id: u32,
    voter: &Address,
) -> Vec<u8> {
    let mut key = result_key(network, proposal_index, option_id);
    key.extend_from_slice(voter.as_bytes());
    key
}
