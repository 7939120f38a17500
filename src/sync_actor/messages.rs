//! Messages accepted by the [`SyncActor`](super::SyncActor).

use tokio::sync::oneshot;

use crate::model::CartLine;
use crate::remote::RemoteError;

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, RemoteError>>;

/// A remote mutation mirrored without waiting for its outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    /// A line that was not in the cart before.
    AddLine(CartLine),
    /// New absolute quantity for every line of a product.
    UpdateQuantity { product_id: String, quantity: u32 },
    RemoveLine { product_id: String },
    Clear,
}

impl RemoteOp {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteOp::AddLine(_) => "add_line",
            RemoteOp::UpdateQuantity { .. } => "update_line_quantity",
            RemoteOp::RemoveLine { .. } => "remove_line",
            RemoteOp::Clear => "clear_cart",
        }
    }
}

/// Internal message type sent to the actor.
///
/// `Apply` is fire-and-forget; the other variants carry a channel for the answer.
#[derive(Debug)]
pub enum SyncRequest {
    Apply(RemoteOp),
    Fetch {
        respond_to: Response<Vec<CartLine>>,
    },
    Merge {
        lines: Vec<CartLine>,
        respond_to: Response<Vec<CartLine>>,
    },
    /// Answered once every request queued before it has been processed.
    Flush { respond_to: oneshot::Sender<()> },
}
