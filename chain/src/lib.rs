//! Read access to the voting contract and to the off-chain content it points at.
//!
//! The sync pipeline only sees the [`ChainReader`] and [`ContentResolver`]
//! traits. [`JsonRpcChainReader`] and [`HttpContentResolver`] are the bundled
//! implementations; tests use the scripted doubles in `tally-nullables`.

pub mod abi;
pub mod error;
pub mod json_rpc;
pub mod payload;
pub mod reader;
pub mod resolver;

pub use error::{ChainError, DecodeError};
pub use json_rpc::{ContractAddresses, JsonRpcChainReader};
pub use payload::VotePayload;
pub use reader::{ChainProposal, ChainReader, ChainVote};
pub use resolver::{ContentResolver, HttpContentResolver};
