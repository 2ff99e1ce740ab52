use pov_crypto::{ChainFault, ChainVerifier, FaultKind};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::HashChain;

/// Result of walking the whole chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationReport {
    /// Blocks that passed every check before the walk stopped.
    pub blocks_checked: u64,
    /// The first inconsistency, if any.
    pub fault: Option<ChainFault>,
}

impl VerificationReport {
    /// Returns `true` if no fault was found.
    pub fn is_valid(&self) -> bool {
        self.fault.is_none()
    }
}

impl HashChain {
    /// Walk the chain from genesis and stop at the first inconsistency.
    ///
    /// Checks index contiguity, the genesis shape, every back-link, and
    /// every stored hash against its recomputed digest. Faults are
    /// reported, never repaired, and do not affect appends or reads. A store
    /// that cannot be reached is an error rather than a fault.
    pub async fn audit(&self) -> LedgerResult<VerificationReport> {
        let mut cursor = self.read_all();
        let mut verifier = ChainVerifier::new();

        let fault = loop {
            let block = match cursor.next_block().await {
                Ok(Some(block)) => block,
                Ok(None) => break None,
                Err(LedgerError::ChainCorrupted { index, reason }) => {
                    break Some(ChainFault {
                        index,
                        kind: FaultKind::Unreadable(reason),
                    });
                }
                Err(e) => return Err(e),
            };
            if let Err(fault) = verifier.check(&block) {
                break Some(fault);
            }
        };

        match &fault {
            Some(f) => warn!(index = f.index, kind = ?f.kind, "chain verification failed"),
            None => debug!(blocks = verifier.blocks_checked(), "chain verified"),
        }
        Ok(VerificationReport {
            blocks_checked: verifier.blocks_checked(),
            fault,
        })
    }

    /// The first inconsistent block, with what was wrong with it.
    pub async fn first_fault(&self) -> LedgerResult<Option<ChainFault>> {
        Ok(self.audit().await?.fault)
    }

    /// Index of the first block that breaks the chain, or `None` if the
    /// whole chain is consistent.
    pub async fn verify_chain(&self) -> LedgerResult<Option<u64>> {
        Ok(self.first_fault().await?.map(|fault| fault.index))
    }

    /// Like [`verify_chain`](Self::verify_chain), but a fault becomes
    /// [`LedgerError::ChainCorrupted`].
    pub async fn ensure_intact(&self) -> LedgerResult<()> {
        match self.first_fault().await? {
            None => Ok(()),
            Some(fault) => Err(LedgerError::ChainCorrupted {
                index: fault.index,
                reason: format!("{:?}", fault.kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use pov_crypto::BlockHasher;
    use pov_store::{BlockStore, FileBlockStore, InMemoryBlockStore};
    use pov_types::Block;
    use serde_json::json;

    use super::*;
    use crate::config::LedgerConfig;

    async fn build_valid_chain(appends: u64) -> Vec<Block> {
        let chain = HashChain::open(Arc::new(InMemoryBlockStore::new()), LedgerConfig::default())
            .await
            .unwrap();
        for n in 0..appends {
            chain.append(json!({"action": "VOTE_CAST", "n": n})).await.unwrap();
        }
        chain.read_all().collect_all().await.unwrap()
    }

    /// A ready ledger over a store holding exactly `blocks`.
    async fn ledger_over(blocks: &[Block]) -> HashChain {
        let store = Arc::new(InMemoryBlockStore::new());
        for block in blocks {
            store.insert(block).await.unwrap();
        }
        HashChain::open(store, LedgerConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn valid_chain_passes() {
        let blocks = build_valid_chain(5).await;
        let chain = ledger_over(&blocks).await;
        let report = chain.audit().await.unwrap();
        assert!(report.is_valid());
        assert_eq!(report.blocks_checked, 6);
        assert_eq!(chain.verify_chain().await.unwrap(), None);
        chain.ensure_intact().await.unwrap();
    }

    #[tokio::test]
    async fn empty_store_is_consistent() {
        let chain = HashChain::new(Arc::new(InMemoryBlockStore::new()), LedgerConfig::default());
        assert_eq!(chain.verify_chain().await.unwrap(), None);
    }

    #[tokio::test]
    async fn edited_payload_is_reported_at_its_index() {
        let mut blocks = build_valid_chain(5).await;
        blocks[3].payload = json!({"action": "VOTE_CAST", "n": 999});
        let chain = ledger_over(&blocks).await;

        let fault = chain.first_fault().await.unwrap().unwrap();
        assert_eq!(fault.index, 3);
        assert_eq!(fault.kind, FaultKind::HashMismatch);
        assert_eq!(chain.verify_chain().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn resealed_edit_is_caught_by_the_next_link() {
        let mut blocks = build_valid_chain(5).await;
        let payload = json!({"action": "VOTE_CAST", "n": "forged"});
        blocks[2] = BlockHasher::seal(pov_types::BlockContent {
            payload: &payload,
            ..blocks[2].content()
        })
        .unwrap();
        let chain = ledger_over(&blocks).await;

        assert_eq!(chain.verify_chain().await.unwrap(), Some(3));
        let err = chain.ensure_intact().await.unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorrupted { index: 3, .. }));
    }

    #[tokio::test]
    async fn appends_continue_on_a_corrupted_chain() {
        let mut blocks = build_valid_chain(2).await;
        blocks[1].payload = json!("tampered");
        let chain = ledger_over(&blocks).await;

        let appended = chain.append(json!({"n": "after"})).await.unwrap();
        assert_eq!(appended.index, 3);
        assert_eq!(chain.verify_chain().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn missing_block_is_a_gap() {
        let mut blocks = build_valid_chain(4).await;
        blocks.remove(2);
        let chain = ledger_over(&blocks).await;

        let fault = chain.first_fault().await.unwrap().unwrap();
        assert_eq!(fault.index, 3);
        assert_eq!(fault.kind, FaultKind::IndexGap { expected: 2 });
    }

    #[tokio::test]
    async fn hand_edited_file_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileBlockStore::open(dir.path()).unwrap());
        let chain = HashChain::open(store.clone(), LedgerConfig::default())
            .await
            .unwrap();
        chain.append(json!({"action": "VOTE_CAST", "choice": "yes"})).await.unwrap();
        chain.append(json!({"action": "VOTE_CAST", "choice": "no"})).await.unwrap();

        let path = store.block_path(1);
        let edited = fs::read_to_string(&path).unwrap().replace("\"yes\"", "\"no\"");
        fs::write(&path, edited).unwrap();

        assert_eq!(chain.verify_chain().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn unreadable_file_is_a_fault_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileBlockStore::open(dir.path()).unwrap());
        let chain = HashChain::open(store.clone(), LedgerConfig::default())
            .await
            .unwrap();
        chain.append(json!({"n": 1})).await.unwrap();
        fs::write(store.block_path(1), b"{ not json").unwrap();

        let fault = chain.first_fault().await.unwrap().unwrap();
        assert_eq!(fault.index, 1);
        assert!(matches!(fault.kind, FaultKind::Unreadable(_)));
    }
}
