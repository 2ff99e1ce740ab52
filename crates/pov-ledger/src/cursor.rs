use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use pov_store::BlockStore;
use pov_types::Block;
use tracing::debug;

use crate::error::LedgerResult;
use crate::ledger::with_timeout;

/// Restartable, paged walk over the chain in ascending index order.
///
/// Pages are fetched lazily, so each block reflects the store at the moment
/// its page was read. This is deliberately not a snapshot:
/// - blocks appended after the cursor was created are returned if their
///   page has not been fetched yet;
/// - reaching the end is not final, since a later call picks up blocks
///   appended in the meantime.
pub struct ChainCursor {
    store: Arc<dyn BlockStore>,
    timeout: Duration,
    page_size: usize,
    next_index: u64,
    buffer: VecDeque<Block>,
}

impl ChainCursor {
    pub(crate) fn new(store: Arc<dyn BlockStore>, timeout: Duration, page_size: usize) -> Self {
        Self {
            store,
            timeout,
            page_size: page_size.max(1),
            next_index: 0,
            buffer: VecDeque::new(),
        }
    }

    /// The next block, or `None` if the store has nothing past the current
    /// position right now.
    pub async fn next_block(&mut self) -> LedgerResult<Option<Block>> {
        if self.buffer.is_empty() {
            let page = with_timeout(
                self.timeout,
                "range",
                self.store.range(self.next_index, self.page_size),
            )
            .await?;
            debug!(from = self.next_index, fetched = page.len(), "fetched chain page");
            if let Some(last) = page.last() {
                self.next_index = last.index + 1;
            }
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }

    /// Start over from genesis. Buffered blocks are discarded so the next
    /// read sees the store as it is now.
    pub fn rewind(&mut self) {
        self.next_index = 0;
        self.buffer.clear();
    }

    /// Drain the remaining blocks into a vector.
    pub async fn collect_all(&mut self) -> LedgerResult<Vec<Block>> {
        let mut blocks = Vec::new();
        while let Some(block) = self.next_block().await? {
            blocks.push(block);
        }
        Ok(blocks)
    }
}

impl std::fmt::Debug for ChainCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainCursor")
            .field("next_index", &self.next_index)
            .field("buffered", &self.buffer.len())
            .field("page_size", &self.page_size)
            .finish()
    }
}
