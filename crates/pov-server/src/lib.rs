//! HTTP server for the Proof of Perspective ledger.
//!
//! Exposes the two ledger operations the application layer needs over
//! HTTP, plus chain verification. The ledger is opened once at startup and
//! shared by every handler through [`AppState`]; handlers never reach the
//! store directly.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::PovServer;
