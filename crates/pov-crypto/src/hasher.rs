use pov_types::{Block, BlockContent, BlockHash};
use sha2::{Digest, Sha256};

use crate::canonical::{self, EncodingError};

/// SHA-256 over the canonical encoding of a block's content.
///
/// There is no domain prefix: a block digest is exactly
/// `SHA-256(canonical(index, timestamp, payload, previous_hash))`, so any
/// tool that reproduces the canonical bytes can check a chain.
pub struct BlockHasher;

impl BlockHasher {
    /// Digest of a block's content.
    pub fn digest(content: &BlockContent<'_>) -> Result<BlockHash, EncodingError> {
        Ok(Self::digest_bytes(&Self::canonical_bytes(content)?))
    }

    /// The exact bytes fed to SHA-256 for `content`.
    pub fn canonical_bytes(content: &BlockContent<'_>) -> Result<Vec<u8>, EncodingError> {
        // serde_json would quietly turn a non-finite float into `null`.
        if !content.timestamp.is_finite() {
            return Err(EncodingError::NonFinite("timestamp"));
        }
        canonical::encode(content)
    }

    /// Raw SHA-256 of already-encoded bytes.
    pub fn digest_bytes(data: &[u8]) -> BlockHash {
        BlockHash::from_digest(Sha256::digest(data).into())
    }

    /// Compute the digest of `content` and return the finished block.
    pub fn seal(content: BlockContent<'_>) -> Result<Block, EncodingError> {
        let hash = Self::digest(&content)?;
        Ok(content.into_block(hash.to_hex()))
    }

    /// Returns `true` if `block.hash` matches its recomputed digest.
    pub fn verify(block: &Block) -> Result<bool, EncodingError> {
        Ok(Self::digest(&block.content())?.to_hex() == block.hash)
    }
}
