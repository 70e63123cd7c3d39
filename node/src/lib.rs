//! Tally indexer node.
//!
//! Loads the TOML configuration, opens the LMDB store, builds one
//! [`NetworkContext`](tally_governance::NetworkContext) per configured
//! network and runs three independent periodic passes over each of them:
//! proposal sync, vote sync and tally. Pass outcomes are reported per
//! network and recorded in Prometheus metrics; the read API serves the
//! committed results.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod scheduler;
pub mod shutdown;
pub mod tracing_spans;

pub use config::{FetchPolicyConfig, FetchPolicyKind, NetworkConfig, NodeConfig, ScheduleConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::IndexerMetrics;
pub use node::TallyNode;
pub use scheduler::{report_outcomes, run_pass, NetworkOutcome, Pass, PassDispatcher, PassSummary};
pub use shutdown::ShutdownController;
