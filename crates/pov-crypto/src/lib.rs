//! Cryptographic primitives for the Proof of Perspective ledger.
//!
//! Provides the canonical JSON encoding used as hash input, SHA-256 block
//! digests, and an incremental verifier for hash-linked chains.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::{encode, encode_value, parse_exact, EncodingError};
pub use chain::{ChainFault, ChainVerifier, FaultKind};
pub use hasher::BlockHasher;
