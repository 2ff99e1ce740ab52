use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use pov_types::Block;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlockStore, InsertOutcome};

/// In-memory, `BTreeMap`-based block store.
///
/// Intended for tests and embedding. Blocks live behind an `RwLock`; the
/// write lock is held only for the duration of a single insert, which is
/// what makes the index check and the write one atomic step.
pub struct InMemoryBlockStore {
    blocks: RwLock<BTreeMap<u64, Block>>,
}

impl InMemoryBlockStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(BTreeMap::new()),
        }
    }

    /// Every stored block, ascending by index.
    pub fn blocks(&self) -> StoreResult<Vec<Block>> {
        Ok(self.read_guard()?.values().cloned().collect())
    }

    fn read_guard(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<u64, Block>>> {
        self.blocks
            .read()
            .map_err(|_| StoreError::Unavailable("block map read lock poisoned".into()))
    }

    fn write_guard(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<u64, Block>>> {
        self.blocks
            .write()
            .map_err(|_| StoreError::Unavailable("block map write lock poisoned".into()))
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn insert(&self, block: &Block) -> StoreResult<InsertOutcome> {
        let mut map = self.write_guard()?;
        if map.contains_key(&block.index) {
            return Ok(InsertOutcome::IndexTaken);
        }
        map.insert(block.index, block.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn head(&self) -> StoreResult<Option<Block>> {
        Ok(self.read_guard()?.values().next_back().cloned())
    }

    async fn get(&self, index: u64) -> StoreResult<Option<Block>> {
        Ok(self.read_guard()?.get(&index).cloned())
    }

    async fn range(&self, from: u64, limit: usize) -> StoreResult<Vec<Block>> {
        Ok(self
            .read_guard()?
            .range(from..)
            .take(limit)
            .map(|(_, block)| block.clone())
            .collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.read_guard()?.len() as u64)
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.blocks.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryBlockStore")
            .field("block_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn block(index: u64) -> Block {
        Block {
            index,
            timestamp: 1_700_000_000.0 + index as f64,
            payload: json!({"n": index}),
            previous_hash: format!("{:064x}", index),
            hash: format!("{:064x}", index + 1),
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_head() {
        let store = InMemoryBlockStore::new();
        assert!(store.head().await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_then_read_back() {
        let store = InMemoryBlockStore::new();
        assert_eq!(store.insert(&block(0)).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(store.get(0).await.unwrap(), Some(block(0)));
        assert_eq!(store.get(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_index_is_refused_without_overwrite() {
        let store = InMemoryBlockStore::new();
        store.insert(&block(0)).await.unwrap();

        let mut rival = block(0);
        rival.payload = json!("rival");
        assert_eq!(store.insert(&rival).await.unwrap(), InsertOutcome::IndexTaken);
        assert_eq!(store.get(0).await.unwrap(), Some(block(0)));
    }

    #[tokio::test]
    async fn head_is_highest_index() {
        let store = InMemoryBlockStore::new();
        for i in [0, 2, 1] {
            store.insert(&block(i)).await.unwrap();
        }
        assert_eq!(store.head().await.unwrap().unwrap().index, 2);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn range_pages_in_index_order() {
        let store = InMemoryBlockStore::new();
        for i in 0..10 {
            store.insert(&block(i)).await.unwrap();
        }
        let page: Vec<u64> = store
            .range(3, 4)
            .await
            .unwrap()
            .iter()
            .map(|b| b.index)
            .collect();
        assert_eq!(page, vec![3, 4, 5, 6]);
        assert!(store.range(10, 4).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_at_one_index_have_one_winner() {
        let store = Arc::new(InMemoryBlockStore::new());
        let mut tasks = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let mut candidate = block(5);
                candidate.payload = json!({"writer": n});
                store.insert(&candidate).await.unwrap()
            }));
        }
        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() == InsertOutcome::Inserted {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
