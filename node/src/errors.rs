// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use glint_kernel::ProtocolError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Artifact fetch failed: {0}")]
    ArtifactFetch(String),
    #[error("Side channel error: {0}")]
    Channel(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error")]
    Internal,
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            NodeError::Protocol(p) => (StatusCode::BAD_REQUEST, p.to_string()),
            NodeError::ArtifactFetch(msg) => (StatusCode::BAD_GATEWAY, msg),
            NodeError::Channel(msg) => (StatusCode::BAD_GATEWAY, msg),
            NodeError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            NodeError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
