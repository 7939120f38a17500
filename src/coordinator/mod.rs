//! # Cart Coordinator
//!
//! The in-memory cart and the rules that keep its two mirrors in step:
//!
//! - every mutation is applied in memory and written to the [`LocalStore`]
//!   before the call returns;
//! - while the session is authenticated, the same mutation is handed to the
//!   [`SyncClient`] and mirrored to the server in the background. Its outcome
//!   never reaches the caller and never rolls back local state;
//! - when the session becomes authenticated, a one-shot login sync merges the
//!   guest cart into the server cart (or fetches the server cart when there is
//!   nothing to merge) and adopts the result.

pub mod error;

pub use error::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::model::{cart_count, cart_total, normalize_lines, CartItem, CartLine};
use crate::store::LocalStore;
use crate::sync_actor::{RemoteOp, SyncClient};

/// What a login sync or refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Guest lines were merged server-side; the cart now holds `lines` lines.
    Merged { lines: usize },
    /// The server cart was fetched and adopted.
    Refreshed { lines: usize },
    /// Another login sync is still outstanding; nothing was done.
    AlreadyRunning,
    /// The server could not be reached; local state is unchanged.
    Failed,
}

/// The cart state/sync engine.
///
/// Built explicitly with its collaborators and shared by reference (usually
/// inside an `Arc`). All methods take `&self`.
pub struct CartCoordinator<L: LocalStore> {
    store: L,
    remote: SyncClient,
    lines: Mutex<Vec<CartLine>>,
    authenticated: AtomicBool,
    syncing: AtomicBool,
}

/// Clears the login-sync flag when the sync finishes or is cancelled.
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<L: LocalStore> CartCoordinator<L> {
    /// Creates a guest-session coordinator, restoring whatever `store` holds.
    ///
    /// An unreadable or corrupt store entry is logged and treated as an empty cart.
    pub fn new(store: L, remote: SyncClient) -> Self {
        let lines = match store.read() {
            Ok(Some(lines)) => normalize_lines(lines),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not restore persisted cart, starting empty");
                Vec::new()
            }
        };
        info!(lines = lines.len(), "Cart restored");

        Self {
            store,
            remote,
            lines: Mutex::new(lines),
            authenticated: AtomicBool::new(false),
            syncing: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `lines` to the store; an empty cart clears the entry instead.
    fn persist(&self, lines: &[CartLine]) {
        let result = if lines.is_empty() {
            self.store.clear()
        } else {
            self.store.write(lines)
        };
        if let Err(e) = result {
            warn!(error = %e, "Could not persist cart");
        }
    }

    fn mirror(&self, op: RemoteOp) {
        if self.is_authenticated() {
            self.remote.dispatch(op);
        }
    }

    /// Adds `quantity` of `item`.
    ///
    /// An existing line with the same `(product_id, size, color)` is
    /// incremented; otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::InvalidPrice`] for a negative or non-finite price. The
    /// cart is unchanged in both cases.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub fn add_to_cart(&self, item: CartItem, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(CartError::InvalidPrice(item.price));
        }

        let key = item.key();
        let mut lines = self.state();
        let op = match lines.iter_mut().find(|line| line.matches(&key)) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity);
                debug!(quantity = existing.quantity, "Incremented line");
                RemoteOp::UpdateQuantity {
                    product_id: existing.product_id.clone(),
                    quantity: existing.quantity,
                }
            }
            None => {
                let line = CartLine::from_item(item, quantity);
                lines.push(line.clone());
                debug!(quantity, "Appended line");
                RemoteOp::AddLine(line)
            }
        };
        self.persist(&lines);
        // Dispatched under the lock: mirrored ops keep mutation order.
        self.mirror(op);
        Ok(())
    }

    /// `add_to_cart(item, 1)`.
    pub fn add_one(&self, item: CartItem) -> Result<(), CartError> {
        self.add_to_cart(item, 1)
    }

    /// Removes every line of `product_id`, whatever its size or color.
    #[instrument(skip(self))]
    pub fn remove_from_cart(&self, product_id: &str) {
        let mut lines = self.state();
        let before = lines.len();
        lines.retain(|line| line.product_id != product_id);
        debug!(removed = before - lines.len(), "Removed lines");
        self.persist(&lines);
        self.mirror(RemoteOp::RemoveLine {
            product_id: product_id.to_owned(),
        });
    }

    /// Sets the quantity of every line of `product_id`.
    ///
    /// A quantity of zero removes the product, exactly like
    /// [`remove_from_cart`](Self::remove_from_cart). Unknown products are ignored.
    #[instrument(skip(self))]
    pub fn update_quantity(&self, product_id: &str, quantity: u32) {
        if quantity < 1 {
            self.remove_from_cart(product_id);
            return;
        }

        let mut lines = self.state();
        let mut matched = false;
        for line in lines.iter_mut().filter(|line| line.product_id == product_id) {
            line.quantity = quantity;
            matched = true;
        }
        if !matched {
            debug!("No line to update");
            return;
        }
        self.persist(&lines);
        self.mirror(RemoteOp::UpdateQuantity {
            product_id: product_id.to_owned(),
            quantity,
        });
    }

    /// Empties the cart and the local store.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) {
        let mut lines = self.state();
        lines.clear();
        self.persist(&lines);
        self.mirror(RemoteOp::Clear);
    }

    /// Sum of `price * quantity` over the cart.
    pub fn cart_total(&self) -> f64 {
        cart_total(&self.state())
    }

    /// Sum of quantities over the cart.
    pub fn cart_count(&self) -> u32 {
        cart_count(&self.state())
    }

    /// Snapshot of the current lines in insertion order.
    pub fn lines(&self) -> Vec<CartLine> {
        self.state().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    /// Adopts a server cart, folding duplicate keys and dropping empty lines.
    fn replace_all(&self, fresh: Vec<CartLine>) -> usize {
        let mut lines = self.state();
        *lines = normalize_lines(fresh);
        self.persist(&lines);
        lines.len()
    }

    /// Replaces the cart (memory and local store) with the server cart.
    ///
    /// On failure the cart is left as it was and [`SyncOutcome::Failed`] is returned.
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> SyncOutcome {
        match self.remote.fetch().await {
            Ok(fresh) => {
                let lines = self.replace_all(fresh);
                info!(lines, "Cart refreshed from server");
                SyncOutcome::Refreshed { lines }
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, keeping local cart");
                SyncOutcome::Failed
            }
        }
    }

    /// Records a change of authentication state.
    ///
    /// On a guest → authenticated transition the login sync runs and its
    /// outcome is returned. Signing out stops remote mirroring and keeps the
    /// local cart. Anything else is a no-op and returns `None`.
    pub async fn set_authenticated(&self, authenticated: bool) -> Option<SyncOutcome> {
        let was = self.authenticated.swap(authenticated, Ordering::AcqRel);
        match (was, authenticated) {
            (false, true) => {
                info!("Session authenticated");
                Some(self.sync_on_login().await)
            }
            (true, false) => {
                info!("Session signed out, remote mirroring stopped");
                None
            }
            _ => None,
        }
    }

    /// One-shot reconciliation after login.
    ///
    /// A non-empty in-memory guest cart is sent in a single merge request and
    /// the merged cart replaces local state; if the merge fails the server cart
    /// is fetched instead. With an empty cart this is a plain
    /// [`refresh_cart`](Self::refresh_cart). Concurrent calls while one is
    /// outstanding return [`SyncOutcome::AlreadyRunning`].
    #[instrument(skip(self))]
    pub async fn sync_on_login(&self) -> SyncOutcome {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Login sync already running");
            return SyncOutcome::AlreadyRunning;
        }
        let _guard = SyncGuard(&self.syncing);

        // Memory is the source of truth; the store may have missed writes.
        let guest = self.lines();

        if guest.is_empty() {
            return self.refresh_cart().await;
        }

        let guest_lines = guest.len();
        match self.remote.merge(guest).await {
            Ok(merged) => {
                let lines = self.replace_all(merged);
                info!(guest_lines, lines, "Guest cart merged");
                SyncOutcome::Merged { lines }
            }
            Err(e) => {
                warn!(error = %e, "Guest cart merge failed, falling back to fetch");
                self.refresh_cart().await
            }
        }
    }

    /// Waits until every remote mirror dispatched so far has been attempted.
    pub async fn flush_remote(&self) {
        self.remote.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::sync_actor::{create_test_client, SyncRequest};

    fn coordinator(store: MemoryStore) -> (CartCoordinator<MemoryStore>, tokio::sync::mpsc::UnboundedReceiver<SyncRequest>) {
        let (client, receiver) = create_test_client();
        (CartCoordinator::new(store, client), receiver)
    }

    fn item(id: &str, price: f64) -> CartItem {
        CartItem::new(id, format!("Item {id}"), price)
    }

    #[test]
    fn test_same_variant_twice_is_one_line() {
        let (cart, _rx) = coordinator(MemoryStore::new());
        cart.add_to_cart(item("p1", 10.0).with_size("M"), 1).unwrap();
        cart.add_to_cart(item("p1", 10.0).with_size("M"), 2).unwrap();
        cart.add_to_cart(item("p1", 10.0).with_size("L"), 1).unwrap();

        let lines = cart.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[1].size, "L");
    }

    #[test]
    fn test_concrete_scenario() {
        let store = MemoryStore::new();
        let (cart, _rx) = coordinator(store.clone());

        cart.add_to_cart(item("p1", 10.0), 2).unwrap();
        assert_eq!(cart.cart_total(), 20.0);
        assert_eq!(cart.cart_count(), 2);

        cart.add_to_cart(item("p1", 10.0), 1).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.cart_total(), 30.0);

        cart.remove_from_cart("p1");
        assert!(cart.is_empty());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_rejects_invalid_input() {
        let (cart, _rx) = coordinator(MemoryStore::new());
        assert!(matches!(
            cart.add_to_cart(item("p1", 1.0), 0),
            Err(CartError::InvalidQuantity(0))
        ));
        assert!(matches!(
            cart.add_to_cart(item("p1", -1.0), 1),
            Err(CartError::InvalidPrice(_))
        ));
        assert!(matches!(
            cart.add_one(item("p1", f64::NAN)),
            Err(CartError::InvalidPrice(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_restores_persisted_cart() {
        let persisted = vec![CartLine::from_item(item("p7", 3.0), 2)];
        let (cart, _rx) = coordinator(MemoryStore::with_lines(persisted.clone()));
        assert_eq!(cart.lines(), persisted);
        assert_eq!(cart.cart_count(), 2);
    }

    #[test]
    fn test_guest_mutations_are_not_mirrored() {
        let (cart, mut rx) = coordinator(MemoryStore::new());
        cart.add_one(item("p1", 1.0)).unwrap();
        cart.update_quantity("p1", 4);
        cart.clear_cart();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_authenticated_mutations_are_mirrored() {
        let (cart, mut rx) = coordinator(MemoryStore::new());
        cart.authenticated.store(true, Ordering::Release);

        cart.add_one(item("p1", 1.0)).unwrap();
        cart.add_one(item("p1", 1.0)).unwrap();
        cart.remove_from_cart("p1");

        let mut ops = Vec::new();
        while let Ok(SyncRequest::Apply(op)) = rx.try_recv() {
            ops.push(op);
        }
        assert_eq!(
            ops,
            vec![
                RemoteOp::AddLine(CartLine::from_item(item("p1", 1.0), 1)),
                RemoteOp::UpdateQuantity {
                    product_id: "p1".into(),
                    quantity: 2
                },
                RemoteOp::RemoveLine {
                    product_id: "p1".into()
                },
            ]
        );
    }

    #[test]
    fn test_update_unknown_product_is_ignored() {
        let store = MemoryStore::new();
        let (cart, _rx) = coordinator(store.clone());
        cart.add_one(item("p1", 2.0)).unwrap();
        cart.update_quantity("zzz", 5);
        assert_eq!(cart.cart_count(), 1);
        assert_eq!(store.snapshot().unwrap()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_sync_guard_resets_after_completion() {
        let (cart, mut rx) = coordinator(MemoryStore::new());
        let responder = tokio::spawn(async move {
            for _ in 0..2 {
                match rx.recv().await {
                    Some(SyncRequest::Fetch { respond_to }) => {
                        let _ = respond_to.send(Ok(Vec::new()));
                    }
                    other => panic!("unexpected request: {other:?}"),
                }
            }
        });

        assert_eq!(cart.sync_on_login().await, SyncOutcome::Refreshed { lines: 0 });
        assert_eq!(cart.sync_on_login().await, SyncOutcome::Refreshed { lines: 0 });
        responder.await.unwrap();
    }
}
