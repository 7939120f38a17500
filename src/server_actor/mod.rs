//! In-process cart server.
//!
//! [`ServerCartActor`] owns one [`ServerCart`] per user and processes requests
//! sequentially, so no locking is needed around the carts. A
//! [`ServerCartClient`] bound to a user id implements
//! [`RemoteCartService`], which lets the coordinator run end to end without a
//! network service.

pub mod entity;

pub use entity::*;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::model::CartLine;
use crate::remote::{RemoteCartService, RemoteError};

type Response<T> = oneshot::Sender<Result<T, RemoteError>>;

/// Requests understood by the [`ServerCartActor`]. Every request is scoped to a user.
#[derive(Debug)]
pub enum ServerCartRequest {
    Fetch {
        user_id: String,
        respond_to: Response<Vec<CartLine>>,
    },
    Add {
        user_id: String,
        line: CartLine,
        respond_to: Response<()>,
    },
    UpdateQuantity {
        user_id: String,
        product_id: String,
        quantity: u32,
        respond_to: Response<()>,
    },
    Remove {
        user_id: String,
        product_id: String,
        respond_to: Response<()>,
    },
    Clear {
        user_id: String,
        respond_to: Response<()>,
    },
    Merge {
        user_id: String,
        lines: Vec<CartLine>,
        respond_to: Response<Vec<CartLine>>,
    },
}

/// The server half. Owns every user's cart and the receiving end of the channel.
pub struct ServerCartActor {
    receiver: mpsc::Receiver<ServerCartRequest>,
    carts: HashMap<String, ServerCart>,
}

impl ServerCartActor {
    /// Creates the actor and an unscoped client; bind it with [`ServerCartClient::for_user`].
    pub fn new(buffer_size: usize) -> (Self, ServerCartClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            carts: HashMap::new(),
        };
        let client = ServerCartClient {
            sender,
            user_id: String::new(),
        };
        (actor, client)
    }

    pub async fn run(mut self) {
        info!("Server cart actor started");

        while let Some(request) = self.receiver.recv().await {
            match request {
                ServerCartRequest::Fetch {
                    user_id,
                    respond_to,
                } => {
                    let lines = self
                        .carts
                        .get(&user_id)
                        .map(|cart| cart.lines().to_vec())
                        .unwrap_or_default();
                    debug!(%user_id, lines = lines.len(), "Fetch");
                    let _ = respond_to.send(Ok(lines));
                }
                ServerCartRequest::Add {
                    user_id,
                    line,
                    respond_to,
                } => {
                    debug!(%user_id, product_id = %line.product_id, "Add");
                    self.carts.entry(user_id).or_default().add(line);
                    let _ = respond_to.send(Ok(()));
                }
                ServerCartRequest::UpdateQuantity {
                    user_id,
                    product_id,
                    quantity,
                    respond_to,
                } => {
                    let result = match self.carts.get_mut(&user_id) {
                        Some(cart) => cart.update_quantity(&product_id, quantity),
                        None => Err(RemoteError::NotFound(product_id.clone())),
                    };
                    if let Err(e) = &result {
                        warn!(%user_id, %product_id, error = %e, "Update failed");
                    }
                    let _ = respond_to.send(result);
                }
                ServerCartRequest::Remove {
                    user_id,
                    product_id,
                    respond_to,
                } => {
                    debug!(%user_id, %product_id, "Remove");
                    if let Some(cart) = self.carts.get_mut(&user_id) {
                        cart.remove(&product_id);
                    }
                    let _ = respond_to.send(Ok(()));
                }
                ServerCartRequest::Clear {
                    user_id,
                    respond_to,
                } => {
                    debug!(%user_id, "Clear");
                    if let Some(cart) = self.carts.get_mut(&user_id) {
                        cart.clear();
                    }
                    let _ = respond_to.send(Ok(()));
                }
                ServerCartRequest::Merge {
                    user_id,
                    lines,
                    respond_to,
                } => {
                    let incoming = lines.len();
                    let merged = self.carts.entry(user_id.clone()).or_default().merge(lines);
                    info!(%user_id, incoming, size = merged.len(), "Merged guest cart");
                    let _ = respond_to.send(Ok(merged));
                }
            }
        }

        info!(carts = self.carts.len(), "Server cart actor shutdown");
    }
}

/// Client for the [`ServerCartActor`], scoped to one user.
#[derive(Clone, Debug)]
pub struct ServerCartClient {
    sender: mpsc::Sender<ServerCartRequest>,
    user_id: String,
}

impl ServerCartClient {
    /// Returns a client acting for `user_id` on the same actor.
    pub fn for_user(&self, user_id: impl Into<String>) -> Self {
        Self {
            sender: self.sender.clone(),
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(String, Response<T>) -> ServerCartRequest,
    ) -> Result<T, RemoteError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(self.user_id.clone(), respond_to))
            .await
            .map_err(|_| RemoteError::Unavailable("server cart actor closed".into()))?;
        response
            .await
            .map_err(|_| RemoteError::Unavailable("server cart actor dropped response channel".into()))?
    }
}

#[async_trait]
impl RemoteCartService for ServerCartClient {
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, RemoteError> {
        self.call(|user_id, respond_to| ServerCartRequest::Fetch {
            user_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, line), fields(user_id = %self.user_id, product_id = %line.product_id))]
    async fn add_line(&self, line: CartLine) -> Result<(), RemoteError> {
        self.call(|user_id, respond_to| ServerCartRequest::Add {
            user_id,
            line,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn update_line_quantity(&self, product_id: &str, quantity: u32) -> Result<(), RemoteError> {
        let product_id = product_id.to_owned();
        self.call(|user_id, respond_to| ServerCartRequest::UpdateQuantity {
            user_id,
            product_id,
            quantity,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn remove_line(&self, product_id: &str) -> Result<(), RemoteError> {
        let product_id = product_id.to_owned();
        self.call(|user_id, respond_to| ServerCartRequest::Remove {
            user_id,
            product_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn clear_cart(&self) -> Result<(), RemoteError> {
        self.call(|user_id, respond_to| ServerCartRequest::Clear {
            user_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, lines), fields(user_id = %self.user_id, lines = lines.len()))]
    async fn merge_guest_cart(&self, lines: Vec<CartLine>) -> Result<Vec<CartLine>, RemoteError> {
        self.call(|user_id, respond_to| ServerCartRequest::Merge {
            user_id,
            lines,
            respond_to,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartItem;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine::from_item(CartItem::new(id, id, 5.0), quantity)
    }

    #[tokio::test]
    async fn test_carts_are_scoped_per_user() {
        let (actor, client) = ServerCartActor::new(8);
        let handle = tokio::spawn(actor.run());
        let alice = client.for_user("alice");
        let bob = client.for_user("bob");

        alice.add_line(line("p1", 1)).await.unwrap();
        alice.add_line(line("p1", 2)).await.unwrap();
        bob.add_line(line("p2", 1)).await.unwrap();

        assert_eq!(alice.fetch_cart().await.unwrap(), vec![line("p1", 3)]);
        assert_eq!(bob.fetch_cart().await.unwrap(), vec![line("p2", 1)]);

        bob.clear_cart().await.unwrap();
        assert!(bob.fetch_cart().await.unwrap().is_empty());

        drop((client, alice, bob));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_update_for_unknown_user_is_not_found() {
        let (actor, client) = ServerCartActor::new(8);
        tokio::spawn(actor.run());
        let result = client.for_user("carol").update_line_quantity("p1", 2).await;
        assert!(matches!(result, Err(RemoteError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_merge_returns_consolidated_cart() {
        let (actor, client) = ServerCartActor::new(8);
        tokio::spawn(actor.run());
        let dave = client.for_user("dave");
        dave.add_line(line("p1", 1)).await.unwrap();

        let merged = dave
            .merge_guest_cart(vec![line("p1", 1), line("p3", 2)])
            .await
            .unwrap();
        assert_eq!(merged, vec![line("p1", 2), line("p3", 2)]);
    }
}
