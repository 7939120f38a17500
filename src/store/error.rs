//! Error types for the local stores.

use thiserror::Error;

/// Errors that can occur while reading or writing the persisted cart.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be read or written.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document is not a valid cart line list.
    #[error("Corrupt cart document: {0}")]
    Serde(#[from] serde_json::Error),

    /// The store's internal lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    Poisoned,
}
