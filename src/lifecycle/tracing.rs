//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber::fmt` subscriber
//! filtered by `RUST_LOG`.
//!
//! ```bash
//! # Lifecycle, merges and refreshes
//! RUST_LOG=info cargo run
//!
//! # Every mirrored operation, including discarded failures
//! RUST_LOG=cart_sync=debug cargo run
//! ```
//!
//! Remote failures that the coordinator swallows are always logged at `warn`,
//! with the operation name as the `op` field:
//!
//! ```text
//! WARN Remote mirror failed, discarding op="remove_line" error=Cart service unavailable: ...
//! ```

/// Initializes the tracing/logging infrastructure for the application.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
