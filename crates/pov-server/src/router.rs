use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all ledger endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/api", get(handler::api_root))
        .route("/api/ledger", get(handler::list_ledger))
        .route("/api/ledger/add", post(handler::add_entry))
        .route("/api/ledger/verify", get(handler::verify_ledger))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
