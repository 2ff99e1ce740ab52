use pov_crypto::EncodingError;
use pov_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The store could not be reached, failed, or timed out. Not retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Every append attempt lost the race for the next index.
    #[error("append gave up after {attempts} attempts under index contention")]
    RetryExhausted { attempts: u32 },

    /// The payload is outside the canonical value model.
    #[error("payload encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// A persisted block is unreadable or breaks the chain invariants.
    #[error("chain corrupted at index {index}: {reason}")]
    ChainCorrupted { index: u64, reason: String },

    /// Append was called before a successful bootstrap.
    #[error("ledger has not been bootstrapped")]
    Uninitialized,
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt { index, reason } => Self::ChainCorrupted { index, reason },
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
