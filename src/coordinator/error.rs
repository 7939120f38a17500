//! Error types for cart operations.

use thiserror::Error;

use crate::remote::RemoteError;

/// Errors surfaced to callers of the cart API.
///
/// Remote failures during mutations are never reported here; they are logged
/// by the sync actor and dropped. `Remote` only appears while building a
/// remote service.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantities added to the cart must be at least one.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Prices must be finite and non-negative.
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Remote cart service error: {0}")]
    Remote(#[from] RemoteError),

    /// A background task failed or panicked during shutdown.
    #[error("Shutdown failed: {0}")]
    Shutdown(String),
}
