//! Foundation types for the Proof of Perspective (PoV) ledger.
//!
//! Every other `pov-*` crate depends on `pov-types`. It knows
//! nothing about hashing or storage: it only describes what a block looks
//! like on the wire and on disk.
//!
//! # Key Types
//!
//! - [`Block`]: One immutable, hash-linked ledger record
//! - [`BlockContent`]: Borrowed view of a block without its `hash` field
//! - [`BlockHash`]: 32-byte SHA-256 digest with hex helpers

pub mod block;
pub mod digest;
pub mod error;
pub mod temporal;

pub use block::{Block, BlockContent, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
pub use digest::BlockHash;
pub use error::TypeError;
pub use temporal::unix_seconds_now;
