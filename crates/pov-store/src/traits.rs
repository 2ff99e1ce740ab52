use async_trait::async_trait;
use pov_types::Block;

use crate::error::StoreResult;

/// Result of an index-unique insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The block is now durably stored at its index.
    Inserted,
    /// Another block already occupies that index; nothing was written.
    IndexTaken,
}

/// Append-only, index-unique block store.
///
/// All implementations must satisfy these invariants:
/// - At most one block is ever stored per index. A losing `insert` reports
///   [`InsertOutcome::IndexTaken`] rather than overwriting or failing.
/// - Stored blocks are returned exactly as inserted.
/// - Reads reflect the store at the moment of the call; there are no
///   multi-call snapshots.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store `block` at `block.index` unless that index is taken.
    async fn insert(&self, block: &Block) -> StoreResult<InsertOutcome>;

    /// The block with the highest index, or `None` if the store is empty.
    async fn head(&self) -> StoreResult<Option<Block>>;

    /// The block at `index`, if present.
    async fn get(&self, index: u64) -> StoreResult<Option<Block>>;

    /// Up to `limit` stored blocks with `index >= from`, ascending.
    async fn range(&self, from: u64, limit: usize) -> StoreResult<Vec<Block>>;

    /// Number of stored blocks.
    async fn count(&self) -> StoreResult<u64>;
}
