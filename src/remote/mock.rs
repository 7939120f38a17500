//! # Mock Cart Service
//!
//! A recording [`RemoteCartService`] for testing the coordinator without a server.
//!
//! Every call is recorded as a [`RemoteCall`]. Responses for the two calls that
//! return data (`fetch_cart`, `merge_guest_cart`) are queued with the fluent
//! builders; write calls succeed unless [`MockCartService::fail_writes`] is set.
//!
//! ```ignore
//! let mock = MockCartService::new();
//! mock.expect_merge().return_ok(vec![line]);
//!
//! let system = CartSystem::start(MemoryStore::new(), mock.clone());
//! // ... drive the coordinator ...
//! system.coordinator.flush_remote().await;
//!
//! assert_eq!(mock.merge_count(), 1);
//! mock.verify();
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{RemoteCartService, RemoteError};
use crate::model::CartLine;

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Fetch,
    Add(CartLine),
    UpdateQuantity { product_id: String, quantity: u32 },
    Remove(String),
    Clear,
    Merge(Vec<CartLine>),
}

#[derive(Default)]
struct MockState {
    calls: Vec<RemoteCall>,
    fetch_responses: VecDeque<Result<Vec<CartLine>, RemoteError>>,
    merge_responses: VecDeque<Result<Vec<CartLine>, RemoteError>>,
    fail_writes: bool,
    unexpected: Vec<RemoteCall>,
}

/// Recording test double for [`RemoteCartService`].
///
/// Clones share state, so keep one clone for assertions and hand the other to
/// the system under test.
#[derive(Clone, Default)]
pub struct MockCartService {
    state: Arc<Mutex<MockState>>,
}

impl MockCartService {
    /// Creates a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next `fetch_cart` response.
    pub fn expect_fetch(&self) -> ResponseBuilder {
        ResponseBuilder {
            state: self.state.clone(),
            kind: ResponseKind::Fetch,
        }
    }

    /// Queues the next `merge_guest_cart` response.
    pub fn expect_merge(&self) -> ResponseBuilder {
        ResponseBuilder {
            state: self.state.clone(),
            kind: ResponseKind::Merge,
        }
    }

    /// Makes every write call (add, update, remove, clear) fail.
    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    /// All calls seen so far, in arrival order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn merge_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, RemoteCall::Merge(_)))
            .count()
    }

    /// Verifies that all queued responses were consumed and no data call
    /// arrived without one.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.unexpected.is_empty() {
            panic!("Unexpected calls without a queued response: {:?}", state.unexpected);
        }
        let remaining = state.fetch_responses.len() + state.merge_responses.len();
        if remaining != 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    fn record_write(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        let rejected = state.fail_writes;
        state.calls.push(call);
        if rejected {
            Err(RemoteError::Unavailable("mock configured to fail writes".into()))
        } else {
            Ok(())
        }
    }

    fn record_read(&self, call: RemoteCall, kind: ResponseKind) -> Result<Vec<CartLine>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        let next = match kind {
            ResponseKind::Fetch => state.fetch_responses.pop_front(),
            ResponseKind::Merge => state.merge_responses.pop_front(),
        };
        next.unwrap_or_else(|| {
            state.unexpected.push(call);
            Err(RemoteError::Unavailable("no response queued".into()))
        })
    }
}

#[derive(Clone, Copy)]
enum ResponseKind {
    Fetch,
    Merge,
}

/// Builder for a queued `fetch_cart` / `merge_guest_cart` response.
pub struct ResponseBuilder {
    state: Arc<Mutex<MockState>>,
    kind: ResponseKind,
}

impl ResponseBuilder {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, lines: Vec<CartLine>) {
        self.push(Ok(lines));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: RemoteError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Vec<CartLine>, RemoteError>) {
        let mut state = self.state.lock().unwrap();
        match self.kind {
            ResponseKind::Fetch => state.fetch_responses.push_back(response),
            ResponseKind::Merge => state.merge_responses.push_back(response),
        }
    }
}

#[async_trait]
impl RemoteCartService for MockCartService {
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, RemoteError> {
        self.record_read(RemoteCall::Fetch, ResponseKind::Fetch)
    }

    async fn add_line(&self, line: CartLine) -> Result<(), RemoteError> {
        self.record_write(RemoteCall::Add(line))
    }

    async fn update_line_quantity(&self, product_id: &str, quantity: u32) -> Result<(), RemoteError> {
        self.record_write(RemoteCall::UpdateQuantity {
            product_id: product_id.to_owned(),
            quantity,
        })
    }

    async fn remove_line(&self, product_id: &str) -> Result<(), RemoteError> {
        self.record_write(RemoteCall::Remove(product_id.to_owned()))
    }

    async fn clear_cart(&self) -> Result<(), RemoteError> {
        self.record_write(RemoteCall::Clear)
    }

    async fn merge_guest_cart(&self, lines: Vec<CartLine>) -> Result<Vec<CartLine>, RemoteError> {
        self.record_read(RemoteCall::Merge(lines), ResponseKind::Merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartItem;

    #[tokio::test]
    async fn test_mock_returns_queued_responses_in_order() {
        let mock = MockCartService::new();
        let line = CartLine::from_item(CartItem::new("p1", "Tee", 20.0), 1);
        mock.expect_fetch().return_ok(vec![line.clone()]);
        mock.expect_fetch().return_err(RemoteError::Rejected("expired".into()));

        assert_eq!(mock.fetch_cart().await.unwrap(), vec![line]);
        assert!(matches!(mock.fetch_cart().await, Err(RemoteError::Rejected(_))));
        assert_eq!(mock.calls(), vec![RemoteCall::Fetch, RemoteCall::Fetch]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_fail_writes() {
        let mock = MockCartService::new();
        assert!(mock.clear_cart().await.is_ok());
        mock.fail_writes();
        assert!(mock.remove_line("p1").await.is_err());
        assert_eq!(
            mock.calls(),
            vec![RemoteCall::Clear, RemoteCall::Remove("p1".into())]
        );
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected calls")]
    async fn test_verify_flags_unqueued_merge() {
        let mock = MockCartService::new();
        let _ = mock.merge_guest_cart(Vec::new()).await;
        mock.verify();
    }
}
