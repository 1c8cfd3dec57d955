// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid task id: {0}")]
    InvalidTaskId(#[from] pdm_core::PdmError),

    #[error("task not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] pdm_store::StoreError),

    #[error(transparent)]
    Worker(#[from] pdm_worker::WorkerError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            HttpError::InvalidTaskId(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound => StatusCode::NOT_FOUND,
            HttpError::Store(pdm_store::StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            HttpError::Store(pdm_store::StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            HttpError::Store(_) | HttpError::Worker(_) | HttpError::Json(_) | HttpError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
