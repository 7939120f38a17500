//! # Remote Sync Actor
//!
//! Owns the [`RemoteCartService`] and mirrors cart mutations to it.
//!
//! The coordinator never awaits a mirrored mutation: it hands a [`RemoteOp`]
//! to the [`SyncClient`], which enqueues it on an unbounded channel and returns
//! immediately. The actor processes requests one at a time, in arrival order,
//! and a failed mutation is logged and discarded. There is no retry; the
//! server copy is re-synced wholesale on the next login or refresh.

mod messages;

pub use messages::*;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::model::CartLine;
use crate::remote::{RemoteCartService, RemoteError};

/// The actor half: owns the receiver and processes requests until every
/// [`SyncClient`] has been dropped.
pub struct SyncActor {
    receiver: mpsc::UnboundedReceiver<SyncRequest>,
}

impl SyncActor {
    pub fn new() -> (Self, SyncClient) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { receiver }, SyncClient { sender })
    }

    /// Runs the event loop against `service`.
    ///
    /// The service is injected here rather than in [`SyncActor::new`] so the
    /// client can be handed out before the service is built.
    pub async fn run<S: RemoteCartService>(mut self, service: S) {
        info!("Sync actor started");
        let mut mirrored = 0usize;
        let mut discarded = 0usize;

        while let Some(request) = self.receiver.recv().await {
            match request {
                SyncRequest::Apply(op) => {
                    let name = op.name();
                    debug!(op = name, ?op, "Apply");
                    match apply(&service, op).await {
                        Ok(()) => mirrored += 1,
                        Err(e) => {
                            discarded += 1;
                            warn!(op = name, error = %e, "Remote mirror failed, discarding");
                        }
                    }
                }
                SyncRequest::Fetch { respond_to } => {
                    let result = service.fetch_cart().await;
                    if let Err(e) = &result {
                        warn!(error = %e, "Fetch failed");
                    }
                    let _ = respond_to.send(result);
                }
                SyncRequest::Merge { lines, respond_to } => {
                    debug!(lines = lines.len(), "Merge");
                    let result = service.merge_guest_cart(lines).await;
                    if let Err(e) = &result {
                        warn!(error = %e, "Merge failed");
                    }
                    let _ = respond_to.send(result);
                }
                SyncRequest::Flush { respond_to } => {
                    let _ = respond_to.send(());
                }
            }
        }

        info!(mirrored, discarded, "Sync actor shutdown");
    }
}

async fn apply<S: RemoteCartService>(service: &S, op: RemoteOp) -> Result<(), RemoteError> {
    match op {
        RemoteOp::AddLine(line) => service.add_line(line).await,
        RemoteOp::UpdateQuantity {
            product_id,
            quantity,
        } => service.update_line_quantity(&product_id, quantity).await,
        RemoteOp::RemoveLine { product_id } => service.remove_line(&product_id).await,
        RemoteOp::Clear => service.clear_cart().await,
    }
}

/// Handle used by the coordinator to talk to the [`SyncActor`].
#[derive(Clone, Debug)]
pub struct SyncClient {
    sender: mpsc::UnboundedSender<SyncRequest>,
}

impl SyncClient {
    /// Enqueues `op` without waiting. A closed actor is logged, never reported.
    pub fn dispatch(&self, op: RemoteOp) {
        let name = op.name();
        if self.sender.send(SyncRequest::Apply(op)).is_err() {
            warn!(op = name, "Sync actor closed, dropping remote mirror");
        }
    }

    pub async fn fetch(&self) -> Result<Vec<CartLine>, RemoteError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Fetch { respond_to })
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())?
    }

    pub async fn merge(&self, lines: Vec<CartLine>) -> Result<Vec<CartLine>, RemoteError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Merge { lines, respond_to })
            .map_err(|_| closed())?;
        response.await.map_err(|_| dropped())?
    }

    /// Waits until every request enqueued so far has been processed.
    ///
    /// Returns immediately if the actor is gone.
    pub async fn flush(&self) {
        let (respond_to, response) = oneshot::channel();
        if self.sender.send(SyncRequest::Flush { respond_to }).is_ok() {
            let _ = response.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

fn closed() -> RemoteError {
    RemoteError::Unavailable("sync actor closed".into())
}

fn dropped() -> RemoteError {
    RemoteError::Unavailable("sync actor dropped response channel".into())
}

/// Creates a client whose requests land on a receiver the test controls.
///
/// Lets a test assert exactly which requests the coordinator produced
/// without running an actor.
pub fn create_test_client() -> (SyncClient, mpsc::UnboundedReceiver<SyncRequest>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (SyncClient { sender }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartItem;
    use crate::remote::mock::{MockCartService, RemoteCall};

    fn line(id: &str) -> CartLine {
        CartLine::from_item(CartItem::new(id, id, 1.0), 1)
    }

    #[tokio::test]
    async fn test_ops_are_applied_in_order() {
        let mock = MockCartService::new();
        let (actor, client) = SyncActor::new();
        let handle = tokio::spawn(actor.run(mock.clone()));

        client.dispatch(RemoteOp::AddLine(line("p1")));
        client.dispatch(RemoteOp::UpdateQuantity {
            product_id: "p1".into(),
            quantity: 4,
        });
        client.dispatch(RemoteOp::Clear);
        client.flush().await;

        assert_eq!(
            mock.calls(),
            vec![
                RemoteCall::Add(line("p1")),
                RemoteCall::UpdateQuantity {
                    product_id: "p1".into(),
                    quantity: 4
                },
                RemoteCall::Clear,
            ]
        );

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_op_does_not_stop_the_actor() {
        let mock = MockCartService::new();
        mock.fail_writes();
        mock.expect_fetch().return_ok(vec![line("p9")]);
        let (actor, client) = SyncActor::new();
        tokio::spawn(actor.run(mock.clone()));

        client.dispatch(RemoteOp::RemoveLine {
            product_id: "p1".into(),
        });
        let fetched = client.fetch().await.unwrap();
        assert_eq!(fetched, vec![line("p9")]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_closed_actor_reports_unavailable() {
        let (actor, client) = SyncActor::new();
        drop(actor);

        client.dispatch(RemoteOp::Clear);
        assert!(client.is_closed());
        assert!(matches!(
            client.merge(vec![line("p1")]).await,
            Err(RemoteError::Unavailable(_))
        ));
        client.flush().await;
    }

    #[tokio::test]
    async fn test_test_client_exposes_requests() {
        let (client, mut receiver) = create_test_client();
        client.dispatch(RemoteOp::RemoveLine {
            product_id: "p2".into(),
        });
        match receiver.recv().await {
            Some(SyncRequest::Apply(RemoteOp::RemoveLine { product_id })) => {
                assert_eq!(product_id, "p2")
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
