//! Block storage for the Proof of Perspective ledger.
//!
//! A block store is an append-only table of [`Block`](pov_types::Block)s
//! keyed by `index`. It is the only shared mutable resource of the ledger,
//! and the one place where concurrent writers meet: the store refuses a
//! second block at an index that is already taken, and the ledger builds
//! its optimistic retry on that refusal.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`InMemoryBlockStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileBlockStore`] -- one JSON file per block in a directory, durable
//!   across restarts and safe to share between processes
//!
//! # Design Rules
//!
//! 1. Blocks are never updated or deleted through the store.
//! 2. `insert` is atomic per index: exactly one writer wins an index.
//! 3. Readers never block writers.
//! 4. The store never interprets or validates block contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileBlockStore;
pub use memory::InMemoryBlockStore;
pub use traits::{BlockStore, InsertOutcome};
