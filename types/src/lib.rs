//! Fundamental types for the governance tally indexer.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! network identifiers, voter addresses, timestamps, token amounts and the
//! balance-weighting rule, proposal status, and decoded votes.

pub mod address;
pub mod amount;
pub mod error;
pub mod network;
pub mod state;
pub mod time;
pub mod vote;

pub use address::Address;
pub use amount::{TokenAmount, Weight, UNIT_SCALE};
pub use error::TypesError;
pub use network::NetworkId;
pub use state::ProposalStatus;
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::DecodedVote;
