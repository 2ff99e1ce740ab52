//! Store doubles for exercising the ledger's failure paths.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pov_crypto::BlockHasher;
use pov_store::{BlockStore, InMemoryBlockStore, InsertOutcome, StoreError, StoreResult};
use pov_types::{Block, BlockContent, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
use serde_json::Value;

pub(crate) fn genesis() -> Block {
    BlockHasher::seal(BlockContent {
        index: 0,
        timestamp: 1_700_000_000.5,
        payload: &Value::String(GENESIS_PAYLOAD.into()),
        previous_hash: GENESIS_PREVIOUS_HASH,
    })
    .unwrap()
}

/// Refuses the first `n` inserts as if another writer had won the index.
pub(crate) struct ContendedStore {
    inner: InMemoryBlockStore,
    refusals_left: AtomicU32,
    insert_calls: AtomicU32,
}

impl ContendedStore {
    pub(crate) fn refusing(n: u32) -> Self {
        Self {
            inner: InMemoryBlockStore::new(),
            refusals_left: AtomicU32::new(n),
            insert_calls: AtomicU32::new(0),
        }
    }

    /// Put a genesis block in place without going through the refusals.
    pub(crate) async fn seed_genesis(&self) {
        self.inner.insert(&genesis()).await.unwrap();
    }

    pub(crate) fn insert_calls(&self) -> u32 {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockStore for ContendedStore {
    async fn insert(&self, block: &Block) -> StoreResult<InsertOutcome> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refusals_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Ok(InsertOutcome::IndexTaken);
        }
        self.inner.insert(block).await
    }

    async fn head(&self) -> StoreResult<Option<Block>> {
        self.inner.head().await
    }

    async fn get(&self, index: u64) -> StoreResult<Option<Block>> {
        self.inner.get(index).await
    }

    async fn range(&self, from: u64, limit: usize) -> StoreResult<Vec<Block>> {
        self.inner.range(from, limit).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.inner.count().await
    }
}

/// Every call fails as if the backend were down.
pub(crate) struct FailingStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".into()))
}

#[async_trait]
impl BlockStore for FailingStore {
    async fn insert(&self, _block: &Block) -> StoreResult<InsertOutcome> {
        down()
    }

    async fn head(&self) -> StoreResult<Option<Block>> {
        down()
    }

    async fn get(&self, _index: u64) -> StoreResult<Option<Block>> {
        down()
    }

    async fn range(&self, _from: u64, _limit: usize) -> StoreResult<Vec<Block>> {
        down()
    }

    async fn count(&self) -> StoreResult<u64> {
        down()
    }
}

/// Answers every call correctly, but only after `delay`.
pub(crate) struct SlowStore {
    inner: InMemoryBlockStore,
    delay: Duration,
}

impl SlowStore {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryBlockStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl BlockStore for SlowStore {
    async fn insert(&self, block: &Block) -> StoreResult<InsertOutcome> {
        tokio::time::sleep(self.delay).await;
        self.inner.insert(block).await
    }

    async fn head(&self) -> StoreResult<Option<Block>> {
        tokio::time::sleep(self.delay).await;
        self.inner.head().await
    }

    async fn get(&self, index: u64) -> StoreResult<Option<Block>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(index).await
    }

    async fn range(&self, from: u64, limit: usize) -> StoreResult<Vec<Block>> {
        tokio::time::sleep(self.delay).await;
        self.inner.range(from, limit).await
    }

    async fn count(&self) -> StoreResult<u64> {
        tokio::time::sleep(self.delay).await;
        self.inner.count().await
    }
}

/// Stalls every insert for `delay`, either after the write (a late
/// acknowledgement) or before it (the write never happens if abandoned).
/// Reads answer immediately.
pub(crate) struct StalledInsertStore {
    inner: InMemoryBlockStore,
    delay: Duration,
    write_first: bool,
}

impl StalledInsertStore {
    pub(crate) fn acking_late(delay: Duration) -> Self {
        Self {
            inner: InMemoryBlockStore::new(),
            delay,
            write_first: true,
        }
    }

    pub(crate) fn never_writing(delay: Duration) -> Self {
        Self {
            write_first: false,
            ..Self::acking_late(delay)
        }
    }

    pub(crate) async fn seed_genesis(&self) {
        self.inner.insert(&genesis()).await.unwrap();
    }
}

#[async_trait]
impl BlockStore for StalledInsertStore {
    async fn insert(&self, block: &Block) -> StoreResult<InsertOutcome> {
        if self.write_first {
            let outcome = self.inner.insert(block).await?;
            tokio::time::sleep(self.delay).await;
            Ok(outcome)
        } else {
            tokio::time::sleep(self.delay).await;
            self.inner.insert(block).await
        }
    }

    async fn head(&self) -> StoreResult<Option<Block>> {
        self.inner.head().await
    }

    async fn get(&self, index: u64) -> StoreResult<Option<Block>> {
        self.inner.get(index).await
    }

    async fn range(&self, from: u64, limit: usize) -> StoreResult<Vec<Block>> {
        self.inner.range(from, limit).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.inner.count().await
    }
}
