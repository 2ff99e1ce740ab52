use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pov_crypto::{BlockHasher, EncodingError};
use pov_store::{BlockStore, InsertOutcome, StoreResult};
use pov_types::{unix_seconds_now, Block, BlockContent, GENESIS_PAYLOAD, GENESIS_PREVIOUS_HASH};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::cursor::ChainCursor;
use crate::error::{LedgerError, LedgerResult};

/// Result of [`HashChain::bootstrap`].
#[derive(Clone, Debug, PartialEq)]
pub enum Bootstrap {
    /// This call wrote the genesis block.
    Created(Block),
    /// The store already had a genesis block (possibly written concurrently
    /// by another instance during this call).
    Existing,
}

/// The hash-chained ledger.
///
/// A `HashChain` starts out uninitialized and becomes ready after
/// [`bootstrap`](Self::bootstrap); appends before that fail with
/// [`LedgerError::Uninitialized`]. Clones share the store handle and the
/// readiness state, so one instance can be handed to every request
/// handler.
#[derive(Clone)]
pub struct HashChain {
    store: Arc<dyn BlockStore>,
    config: LedgerConfig,
    ready: Arc<AtomicBool>,
}

impl HashChain {
    /// Wrap a store. Nothing is read or written until
    /// [`bootstrap`](Self::bootstrap).
    pub fn new(store: Arc<dyn BlockStore>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// [`new`](Self::new) followed by [`bootstrap`](Self::bootstrap).
    pub async fn open(store: Arc<dyn BlockStore>, config: LedgerConfig) -> LedgerResult<Self> {
        let chain = Self::new(store, config);
        chain.bootstrap().await?;
        Ok(chain)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns `true` once [`bootstrap`](Self::bootstrap) has succeeded.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Write the genesis block if the store is empty.
    ///
    /// Idempotent, and safe to run from several instances at once: the
    /// genesis insert goes through the store's index uniqueness check, so
    /// only one genesis block can ever be written and the losers treat the
    /// refusal as success.
    pub async fn bootstrap(&self) -> LedgerResult<Bootstrap> {
        if self.store_call("head", self.store.head()).await?.is_some() {
            self.ready.store(true, Ordering::Release);
            debug!("ledger already initialized");
            return Ok(Bootstrap::Existing);
        }

        let payload = Value::String(GENESIS_PAYLOAD.into());
        let genesis = BlockHasher::seal(BlockContent {
            index: 0,
            timestamp: unix_seconds_now(),
            payload: &payload,
            previous_hash: GENESIS_PREVIOUS_HASH,
        })?;

        let outcome = self.insert_checked(&genesis).await?;
        self.ready.store(true, Ordering::Release);
        match outcome {
            InsertOutcome::Inserted => {
                info!(hash = %genesis.hash, "created genesis block");
                Ok(Bootstrap::Created(genesis))
            }
            InsertOutcome::IndexTaken => {
                debug!("genesis block written concurrently by another instance");
                Ok(Bootstrap::Existing)
            }
        }
    }

    /// Record `payload` as the next block and return it.
    ///
    /// Each attempt links to the head it read. If another writer takes that
    /// index first, the attempt is rebuilt on the new head after a jittered
    /// backoff, up to `max_retries` times. A returned block is durably
    /// stored exactly once. An insert that times out is checked against the
    /// store before giving up, so an error means the block was not found
    /// stored; a backend that keeps writing after its call was abandoned may
    /// still publish it later.
    pub async fn append(&self, payload: Value) -> LedgerResult<Block> {
        if !self.is_ready() {
            return Err(LedgerError::Uninitialized);
        }

        let backoff = self.config.backoff();
        let attempts = self.config.max_attempts();
        for attempt in 1..=attempts {
            let head = self
                .store_call("head", self.store.head())
                .await?
                .ok_or(LedgerError::Uninitialized)?;

            let candidate = BlockHasher::seal(BlockContent {
                index: head.index + 1,
                timestamp: unix_seconds_now(),
                payload: &payload,
                previous_hash: &head.hash,
            })?;

            match self.insert_checked(&candidate).await? {
                InsertOutcome::Inserted => {
                    info!(index = candidate.index, hash = %candidate.hash, attempt, "appended block");
                    return Ok(candidate);
                }
                InsertOutcome::IndexTaken => {
                    debug!(index = candidate.index, attempt, "index taken by a concurrent writer");
                    if attempt < attempts {
                        tokio::time::sleep(backoff.jittered(attempt - 1)).await;
                    }
                }
            }
        }

        warn!(attempts, "append abandoned under index contention");
        Err(LedgerError::RetryExhausted { attempts })
    }

    /// Append any serializable event.
    ///
    /// The value is lowered into the payload model before the store is
    /// touched, so an unsupported value fails without side effects.
    pub async fn append_serializable<T>(&self, payload: &T) -> LedgerResult<Block>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(payload)
            .map_err(|e| EncodingError::Unsupported(e.to_string()))?;
        self.append(value).await
    }

    /// The block with the highest index, if any.
    pub async fn head(&self) -> LedgerResult<Option<Block>> {
        self.store_call("head", self.store.head()).await
    }

    /// Number of persisted blocks.
    pub async fn block_count(&self) -> LedgerResult<u64> {
        self.store_call("count", self.store.count()).await
    }

    /// Lazily iterate the chain from genesis.
    ///
    /// The cursor is not a snapshot: pages are fetched on demand, so blocks
    /// appended while it is being walked may or may not show up.
    pub fn read_all(&self) -> ChainCursor {
        ChainCursor::new(
            Arc::clone(&self.store),
            self.config.store_timeout(),
            self.config.page_size,
        )
    }

    /// Insert under the store timeout. When the call times out the store
    /// may still have taken the write, so look the index up before
    /// reporting the store unavailable.
    async fn insert_checked(&self, block: &Block) -> LedgerResult<InsertOutcome> {
        let limit = self.config.store_timeout();
        match tokio::time::timeout(limit, self.store.insert(block)).await {
            Ok(result) => Ok(result?),
            Err(_) => match self.store_call("get", self.store.get(block.index)).await? {
                Some(stored) if stored.hash == block.hash => {
                    debug!(index = block.index, "timed-out insert found stored");
                    Ok(InsertOutcome::Inserted)
                }
                Some(_) => Ok(InsertOutcome::IndexTaken),
                None => Err(LedgerError::StoreUnavailable(format!(
                    "insert timed out after {}ms",
                    limit.as_millis()
                ))),
            },
        }
    }

    async fn store_call<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> LedgerResult<T> {
        with_timeout(self.config.store_timeout(), op, call).await
    }
}

impl std::fmt::Debug for HashChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashChain")
            .field("config", &self.config)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Run one store call under `limit`; an elapsed limit counts as the store
/// being unavailable.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    op: &'static str,
    call: impl Future<Output = StoreResult<T>>,
) -> LedgerResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(LedgerError::from),
        Err(_) => Err(LedgerError::StoreUnavailable(format!(
            "{op} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
