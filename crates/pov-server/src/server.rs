use std::sync::Arc;

use pov_ledger::HashChain;
use pov_store::FileBlockStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Proof of Perspective ledger server.
pub struct PovServer {
    config: ServerConfig,
}

impl PovServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router over an already opened ledger (useful for testing).
    pub fn router(&self, state: AppState) -> axum::Router {
        build_router(state)
    }

    /// Open the ledger under the configured data directory.
    ///
    /// Bootstraps the genesis block when the directory is empty.
    pub async fn open_ledger(&self) -> ServerResult<HashChain> {
        let store = FileBlockStore::open(&self.config.data_dir)?;
        let ledger = HashChain::open(Arc::new(store), self.config.ledger.clone()).await?;
        Ok(ledger)
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let ledger = self.open_ledger().await?;
        let app = build_router(AppState { ledger });
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            data_dir = %self.config.data_dir.display(),
            "ledger server listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ServerError::Io)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = PovServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:5000".parse().unwrap());
    }

    #[tokio::test]
    async fn open_ledger_bootstraps_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().join("chain"),
            ..ServerConfig::default()
        };
        let server = PovServer::new(config);

        let ledger = server.open_ledger().await.unwrap();
        assert_eq!(ledger.block_count().await.unwrap(), 1);

        // Reopening finds the existing genesis.
        let again = server.open_ledger().await.unwrap();
        assert_eq!(again.block_count().await.unwrap(), 1);
        let _router = server.router(AppState { ledger: again });
    }
}
