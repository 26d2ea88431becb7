//! Error types for the App Search client.
//!
//! # Design
//! The first six variants are the service-level failures callers match on:
//! five come from HTTP status classification in `RequestSession`, and
//! `InvalidDocument` is synthesized by `AppSearchClient::index_document` from
//! a successful batch response. Every other non-success status lands in
//! `HttpError` with the raw status, reason phrase and body. The remaining
//! variants cover local failures (transport, JSON, signing, configuration).

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `AppSearchClient` and `RequestSession`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 401: the API key was rejected.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: String },

    /// The server returned 400. Carries the raw response body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The server returned 409.
    #[error("record already exists")]
    RecordAlreadyExists,

    /// The server returned 404.
    #[error("record does not exist")]
    NonExistentRecord,

    /// The server returned 403.
    #[error("forbidden")]
    Forbidden,

    /// A single indexed document was rejected by the service.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String, document: Value },

    /// The server returned a 4xx/5xx status not covered above.
    #[error("HTTP {status} {reason}: {body}")]
    HttpError {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be decoded as expected.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A signed search key could not be produced.
    #[error("signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Client configuration is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True for failures reported by the App Search service itself, as
    /// opposed to transport, encoding or configuration problems.
    pub fn is_app_search_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidCredentials { .. }
                | ApiError::BadRequest(_)
                | ApiError::RecordAlreadyExists
                | ApiError::NonExistentRecord
                | ApiError::Forbidden
                | ApiError::InvalidDocument { .. }
        )
    }

    /// HTTP status this error was classified from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::InvalidCredentials { .. } => Some(401),
            ApiError::BadRequest(_) => Some(400),
            ApiError::RecordAlreadyExists => Some(409),
            ApiError::NonExistentRecord => Some(404),
            ApiError::Forbidden => Some(403),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
