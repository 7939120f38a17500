//! Runtime orchestration and lifecycle management.
//!
//! - [`CartSystem`] - starts the sync actor (and, when no cart service is
//!   configured, the in-process server cart), builds the coordinator, and
//!   shuts everything down in order
//! - [`setup_tracing`] - initializes the tracing/logging infrastructure

pub mod cart_system;
pub mod tracing;

pub use cart_system::*;
pub use self::tracing::setup_tracing;
