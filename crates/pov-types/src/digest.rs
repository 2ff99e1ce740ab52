use std::fmt;

use crate::error::TypeError;

/// A 256-bit block digest.
///
/// Blocks carry their hashes as lowercase hex strings on the wire; this type
/// is the parsed form used when hashes are computed or compared.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// Length of the hex form.
    pub const HEX_LEN: usize = 64;

    /// Wrap a pre-computed digest.
    pub const fn from_digest(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse the 64-character lowercase hex form.
    ///
    /// Uppercase digits are rejected: two spellings of the same digest would
    /// compare unequal as strings inside a block.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TypeError::NotLowercase);
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.short_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let hash = BlockHash::from_digest([0xab; 32]);
        let hex = hash.to_hex();
        assert_eq!(hex.len(), BlockHash::HEX_LEN);
        assert_eq!(BlockHash::from_hex(&hex).unwrap(), hash);
    }

    #[test]
    fn short_hex_is_eight_chars() {
        let hash = BlockHash::from_digest([0x01; 32]);
        assert_eq!(hash.short_hex(), "01010101");
    }

    #[test]
    fn rejects_uppercase() {
        let upper = "AB".repeat(32);
        assert_eq!(BlockHash::from_hex(&upper), Err(TypeError::NotLowercase));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = BlockHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn rejects_genesis_marker() {
        assert!(BlockHash::from_hex("0").is_err());
    }
}
