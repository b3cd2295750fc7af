//! Fixture handlers
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::MockState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use ragprobe_core::{RagResult, TopK};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Canned answer returned for every query
pub const FIXTURE_ANSWER: &str = "Based on the retrieved context, the answer to your question is: \
This is a comprehensive response that demonstrates the RAG (Retrieval-Augmented Generation) \
system's ability to combine retrieved information with generated content to provide accurate \
and contextual answers.";

/// Canned contexts, most relevant first
pub const FIXTURE_CONTEXTS: [&str; 3] = [
    "Context 1: This is the first relevant piece of information retrieved from the knowledge base that helps answer the question.",
    "Context 2: Additional supporting information that provides more depth and context to the query.",
    "Context 3: Final piece of contextual data that completes the comprehensive answer.",
];

/// Query request body
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// User's question
    pub query: String,

    /// Number of contexts wanted
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    i64::from(TopK::DEFAULT)
}

/// Fixture result for a given top-K: the canned contexts, at most `top_k`
pub fn fixture_result(top_k: usize) -> RagResult {
    RagResult::new(
        FIXTURE_ANSWER,
        FIXTURE_CONTEXTS
            .iter()
            .take(top_k)
            .map(|c| c.to_string())
            .collect(),
    )
}

/// Handle RAG query requests
pub async fn query_handler(
    State(state): State<Arc<MockState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<RagResult>, AppError> {
    state.increment_requests();

    let Json(req) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if req.query.trim().is_empty() {
        return Err(AppError::Unprocessable(
            "query must not be empty".to_string(),
        ));
    }

    let range = i64::from(TopK::MIN)..=i64::from(TopK::MAX);
    if !range.contains(&req.top_k) {
        return Err(AppError::Unprocessable(format!(
            "top_k must be between {} and {}",
            TopK::MIN,
            TopK::MAX
        )));
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    tracing::debug!(top_k = req.top_k, "Serving fixture answer");
    Ok(Json(fixture_result(req.top_k as usize)))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub queries_served: u64,
}

/// Liveness probe
pub async fn health_check(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
        queries_served: state.get_request_count(),
    })
}
