//! Hash-chained, append-only event ledger for the Proof of Perspective
//! platform.
//!
//! This crate is the only component the application layer talks to when it
//! records or inspects events. It provides:
//! - [`HashChain`]: genesis bootstrap, concurrent-safe append, lazy reads
//! - [`ChainCursor`]: restartable, paged iteration over the chain
//! - Chain verification that reports the first offending index
//! - [`LedgerConfig`]: retry, backoff, timeout, and paging knobs
//!
//! # Concurrency
//!
//! Appends use optimistic insertion. Each attempt reads the head, builds
//! the next block, and inserts it; the store refuses an index that another
//! writer already took, in which case the attempt is rebuilt on the new
//! head after a jittered exponential backoff. Several processes may share
//! one store this way without any lock.
//!
//! The chain's `index` is the only ordering guarantee. Two concurrent
//! appends may land in either order regardless of which was issued first.

pub mod backoff;
pub mod config;
pub mod cursor;
pub mod error;
pub mod ledger;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::Backoff;
pub use config::LedgerConfig;
pub use cursor::ChainCursor;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Bootstrap, HashChain};
pub use pov_crypto::{parse_exact, ChainFault, EncodingError, FaultKind};
pub use validation::VerificationReport;
