//! Fixture error responses
//!
//! Errors are reported as `{"detail": "..."}`, the shape the client reads
//! its failure message from.
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message
    pub detail: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Body could not be read as a query request
    BadRequest(String),
    /// Well-formed request with invalid values
    Unprocessable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        (status, Json(ApiError { detail })).into_response()
    }
}
