//! Error types for remote cart services.

use thiserror::Error;

/// Errors returned by a [`RemoteCartService`](super::RemoteCartService).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered `"success": false`.
    #[error("Cart service rejected request: {0}")]
    Rejected(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The referenced cart line does not exist on the server.
    #[error("Cart line not found: {0}")]
    NotFound(String),

    /// The service (or the task talking to it) is not reachable.
    #[error("Cart service unavailable: {0}")]
    Unavailable(String),
}
