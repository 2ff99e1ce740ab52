use pov_types::{Block, BlockHash};

use crate::hasher::BlockHasher;

/// What was wrong with the first offending block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The block's index is not the next one in the run (gap or duplicate).
    IndexGap { expected: u64 },
    /// Index 0 does not carry the genesis payload and `"0"` back-link.
    NotGenesis,
    /// `previous_hash` differs from the preceding block's `hash`.
    BrokenLink,
    /// `hash` is not a 64-character lowercase hex digest.
    MalformedHash,
    /// `hash` differs from the recomputed digest of the content.
    HashMismatch,
    /// The content could not be encoded for hashing at all.
    Unencodable(String),
    /// The stored record could not be decoded into a block.
    Unreadable(String),
}

/// The first block at which a chain stops being consistent.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("chain fault at index {index}: {kind:?}")]
pub struct ChainFault {
    pub index: u64,
    pub kind: FaultKind,
}

/// Incremental hash chain verifier.
///
/// Blocks are fed in ascending order, one at a time, so a chain can be
/// checked while it is being paged out of a store. Checks per block:
/// 1. Its index is exactly one past the previous block's (0 first)
/// 2. Index 0 has the genesis shape
/// 3. `previous_hash` links to the previous block's `hash`
/// 4. `hash` is well-formed and equals the recomputed digest
#[derive(Debug, Default)]
pub struct ChainVerifier {
    next_index: u64,
    previous_hash: Option<String>,
}

impl ChainVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks accepted so far.
    pub fn blocks_checked(&self) -> u64 {
        self.next_index
    }

    /// Check the next block in order.
    ///
    /// After a fault the verifier state is unspecified; start a new one to
    /// check again.
    pub fn check(&mut self, block: &Block) -> Result<(), ChainFault> {
        let fault = |kind| ChainFault {
            index: block.index,
            kind,
        };

        if block.index != self.next_index {
            return Err(fault(FaultKind::IndexGap {
                expected: self.next_index,
            }));
        }

        match &self.previous_hash {
            None if !block.is_genesis() => return Err(fault(FaultKind::NotGenesis)),
            None => {}
            Some(prev) if *prev != block.previous_hash => {
                return Err(fault(FaultKind::BrokenLink));
            }
            Some(_) => {}
        }

        if BlockHash::from_hex(&block.hash).is_err() {
            return Err(fault(FaultKind::MalformedHash));
        }

        match BlockHasher::verify(block) {
            Ok(true) => {}
            Ok(false) => return Err(fault(FaultKind::HashMismatch)),
            Err(e) => return Err(fault(FaultKind::Unencodable(e.to_string()))),
        }

        self.previous_hash = Some(block.hash.clone());
        self.next_index += 1;
        Ok(())
    }

    /// Verify a complete in-memory chain.
    pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainFault> {
        let mut verifier = Self::new();
        blocks.iter().try_for_each(|block| verifier.check(block))
    }
}
