use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload carried by the genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// One immutable, hash-linked ledger record.
///
/// The serialized shape is exactly five fields and is both the persisted
/// and the externally visible schema. Storage backends must not add
/// identifiers of their own to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    /// Position in the chain, starting at 0 with no gaps.
    pub index: u64,
    /// Creation time in seconds since the UNIX epoch.
    pub timestamp: f64,
    /// Caller-supplied event data. Opaque to the ledger.
    pub payload: Value,
    /// Hex digest of the preceding block, `"0"` for genesis.
    pub previous_hash: String,
    /// Hex digest of this block's [`BlockContent`].
    pub hash: String,
}

impl Block {
    /// Everything except `hash`: the input to the block digest.
    pub fn content(&self) -> BlockContent<'_> {
        BlockContent {
            index: self.index,
            timestamp: self.timestamp,
            payload: &self.payload,
            previous_hash: &self.previous_hash,
        }
    }

    /// Returns `true` if this block has the genesis shape.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
            && self.previous_hash == GENESIS_PREVIOUS_HASH
            && self.payload.as_str() == Some(GENESIS_PAYLOAD)
    }
}

/// Borrowed view of a block without its `hash`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlockContent<'a> {
    pub index: u64,
    pub timestamp: f64,
    pub payload: &'a Value,
    pub previous_hash: &'a str,
}

impl<'a> BlockContent<'a> {
    /// Seal this content into a block with the given hash.
    pub fn into_block(self, hash: String) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            payload: self.payload.clone(),
            previous_hash: self.previous_hash.to_string(),
            hash,
        }
    }
}
