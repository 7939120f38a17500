//! Server-side cart rules.
//!
//! One [`ServerCart`] exists per user inside the
//! [`ServerCartActor`](super::ServerCartActor). Guest lines are folded in with
//! the same identity rule the coordinator uses: an existing
//! `(product_id, size, color)` has its quantity increased, anything else is
//! appended.

use crate::model::{merge_line, CartLine};
use crate::remote::RemoteError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerCart {
    lines: Vec<CartLine>,
}

impl ServerCart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn add(&mut self, line: CartLine) {
        merge_line(&mut self.lines, line);
    }

    /// Sets the quantity of every line of `product_id`; zero removes them.
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), RemoteError> {
        if !self.lines.iter().any(|line| line.product_id == product_id) {
            return Err(RemoteError::NotFound(product_id.to_owned()));
        }
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }
        self.lines
            .iter_mut()
            .filter(|line| line.product_id == product_id)
            .for_each(|line| line.quantity = quantity);
        Ok(())
    }

    /// Removes every variant of `product_id`. Removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn merge(&mut self, guest: Vec<CartLine>) -> Vec<CartLine> {
        for line in guest.into_iter().filter(|line| line.quantity > 0) {
            merge_line(&mut self.lines, line);
        }
        self.lines.clone()
    }
}
