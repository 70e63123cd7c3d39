//! Pre-built [`tracing::Span`] constructors for the periodic passes.
//!
//! Every pass runs inside one of these so log lines from concurrent
//! networks can be told apart by the `network` field.

use tally_types::NetworkId;
use tracing::{info_span, Span};

/// Span covering one proposal sync pass over a network.
pub fn proposal_sync_span(network: NetworkId) -> Span {
    info_span!("proposal_sync", network = %network)
}

/// Span covering one vote sweep over a network's open proposals.
pub fn vote_sync_span(network: NetworkId) -> Span {
    info_span!("vote_sync", network = %network)
}

/// Span covering one tally pass over a network's due proposals.
pub fn tally_span(network: NetworkId) -> Span {
    info_span!("tally", network = %network)
}
