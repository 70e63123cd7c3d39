//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the sync pipeline (clock, chain, off-chain
//! content, storage) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Return scripted, deterministic values
//! - Can be made to fail on demand
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod resolver;
pub mod store;

pub use chain::NullChain;
pub use clock::NullClock;
pub use resolver::NullResolver;
pub use store::NullStore;
