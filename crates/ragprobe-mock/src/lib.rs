//! ragprobe Mock - fixture RAG endpoint
//!
//! Serves a canned answer over the same JSON contract as a real RAG
//! service, so the client can be exercised without one.

pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::MockState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the fixture router
pub fn create_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/query", post(handlers::query_handler))
        .layer(TraceLayer::new_for_http())
        // Browser front ends call the fixture from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router with default state and no latency
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(MockState::default()))
}

/// Serve the fixture on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: Arc<MockState>) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}
