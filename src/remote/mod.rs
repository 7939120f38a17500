//! The server-held cart, as seen by the coordinator.
//!
//! [`RemoteCartService`] is the contract; adapters:
//!
//! - [`HttpCartService`]: JSON REST client built on `reqwest`.
//! - [`ServerCartClient`](crate::server_actor::ServerCartClient): in-process server cart actor.
//! - [`mock::MockCartService`]: recording test double.

pub mod error;
pub mod http;
pub mod mock;

pub use error::*;
pub use http::*;

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::CartLine;

/// CRUD over the cart of the authenticated session, plus the guest merge.
#[async_trait]
pub trait RemoteCartService: Send + Sync + 'static {
    /// Current server cart, in server order.
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, RemoteError>;

    async fn add_line(&self, line: CartLine) -> Result<(), RemoteError>;

    async fn update_line_quantity(&self, product_id: &str, quantity: u32) -> Result<(), RemoteError>;

    /// Removes every line of `product_id`, whatever its size or color.
    async fn remove_line(&self, product_id: &str) -> Result<(), RemoteError>;

    async fn clear_cart(&self) -> Result<(), RemoteError>;

    /// Folds guest lines into the server cart and returns the consolidated cart.
    async fn merge_guest_cart(&self, lines: Vec<CartLine>) -> Result<Vec<CartLine>, RemoteError>;
}

#[async_trait]
impl<S: RemoteCartService + ?Sized> RemoteCartService for Arc<S> {
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, RemoteError> {
        (**self).fetch_cart().await
    }

    async fn add_line(&self, line: CartLine) -> Result<(), RemoteError> {
        (**self).add_line(line).await
    }

    async fn update_line_quantity(&self, product_id: &str, quantity: u32) -> Result<(), RemoteError> {
        (**self).update_line_quantity(product_id, quantity).await
    }

    async fn remove_line(&self, product_id: &str) -> Result<(), RemoteError> {
        (**self).remove_line(product_id).await
    }

    async fn clear_cart(&self) -> Result<(), RemoteError> {
        (**self).clear_cart().await
    }

    async fn merge_guest_cart(&self, lines: Vec<CartLine>) -> Result<Vec<CartLine>, RemoteError> {
        (**self).merge_guest_cart(lines).await
    }
}
