use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pov_types::Block;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlockStore, InsertOutcome};

const FILE_PREFIX: &str = "block-";
const FILE_SUFFIX: &str = ".json";

/// Directory-backed block store: one pretty-printed JSON file per block.
///
/// On-disk layout:
/// ```text
/// <dir>/block-00000000000000000000.json
/// <dir>/block-00000000000000000001.json
/// ...
/// ```
///
/// Each block is written to a temporary file in the same directory and then
/// published with a no-clobber link, so the file for an index appears
/// atomically and at most once. That holds across threads and across
/// processes sharing the directory, which gives the index-uniqueness
/// guarantee without any lock file.
///
/// The highest index seen is cached and extended by probing for the next
/// file, so finding the head does not rescan the directory.
#[derive(Clone)]
pub struct FileBlockStore {
    inner: Arc<Inner>,
}

struct Inner {
    dir: PathBuf,
    /// One past the highest index known to exist (0 = none seen).
    known_len: AtomicU64,
}

impl FileBlockStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let inner = Inner {
            dir,
            known_len: AtomicU64::new(0),
        };
        let len = inner.scan_indices()?.last().map(|i| i + 1).unwrap_or(0);
        inner.known_len.store(len, Ordering::Release);
        debug!(dir = %inner.dir.display(), blocks = len, "opened file block store");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Root directory of this store.
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    /// File holding the block at `index`.
    pub fn block_path(&self, index: u64) -> PathBuf {
        self.inner.path(index)
    }

    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> StoreResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StoreError::Unavailable(format!("blocking store task failed: {e}")))?
    }
}

impl Inner {
    fn path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{index:020}{FILE_SUFFIX}"))
    }

    /// All block indices present on disk, ascending.
    fn scan_indices(&self) -> StoreResult<Vec<u64>> {
        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            let index = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
                .filter(|digits| digits.len() == 20)
                .and_then(|digits| digits.parse::<u64>().ok());
            if let Some(index) = index {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Advance the cached length past any blocks written since the last look.
    fn probe_len(&self) -> StoreResult<u64> {
        let mut len = self.known_len.load(Ordering::Acquire);
        while self.path(len).try_exists()? {
            len += 1;
        }
        self.known_len.fetch_max(len, Ordering::AcqRel);
        Ok(len)
    }

    fn read(&self, index: u64) -> StoreResult<Option<Block>> {
        let bytes = match fs::read(self.path(index)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let block: Block = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            index,
            reason: e.to_string(),
        })?;
        if block.index != index {
            return Err(StoreError::Corrupt {
                index,
                reason: format!("file holds block {}", block.index),
            });
        }
        Ok(Some(block))
    }

    fn insert(&self, block: &Block) -> StoreResult<InsertOutcome> {
        let target = self.path(block.index);
        if target.try_exists()? {
            return Ok(InsertOutcome::IndexTaken);
        }

        let json = serde_json::to_vec_pretty(block)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&target) {
            Ok(_) => {
                self.known_len.fetch_max(block.index + 1, Ordering::AcqRel);
                Ok(InsertOutcome::Inserted)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(InsertOutcome::IndexTaken)
            }
            Err(e) => Err(StoreError::Io(e.error)),
        }
    }
}

#[async_trait]
impl BlockStore for FileBlockStore {
    async fn insert(&self, block: &Block) -> StoreResult<InsertOutcome> {
        let block = block.clone();
        self.blocking(move |inner| inner.insert(&block)).await
    }

    async fn head(&self) -> StoreResult<Option<Block>> {
        self.blocking(|inner| {
            let len = inner.probe_len()?;
            if len == 0 {
                return Ok(None);
            }
            if let Some(block) = inner.read(len - 1)? {
                return Ok(Some(block));
            }
            // The head file was removed out of band; the highest file left
            // is the head, so appends refill the hole.
            warn!(index = len - 1, "head block file missing, rescanning");
            match inner.scan_indices()?.last() {
                Some(&index) => inner.read(index),
                None => Ok(None),
            }
        })
        .await
    }

    async fn get(&self, index: u64) -> StoreResult<Option<Block>> {
        self.blocking(move |inner| inner.read(index)).await
    }

    async fn range(&self, from: u64, limit: usize) -> StoreResult<Vec<Block>> {
        self.blocking(move |inner| {
            let end = inner.probe_len()?.min(from.saturating_add(limit as u64));
            let mut blocks = Vec::new();
            // A missing file below the head is skipped, not treated as the end.
            for index in from..end {
                if let Some(block) = inner.read(index)? {
                    blocks.push(block);
                }
            }
            Ok(blocks)
        })
        .await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.blocking(|inner| Ok(inner.scan_indices()?.len() as u64))
            .await
    }
}

impl std::fmt::Debug for FileBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBlockStore")
            .field("dir", &self.inner.dir)
            .field("known_len", &self.inner.known_len.load(Ordering::Relaxed))
            .finish()
    }
}
