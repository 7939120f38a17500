use std::sync::{Arc, Mutex};

use super::{LocalStore, StoreError};
use crate::model::CartLine;

/// In-memory [`LocalStore`].
///
/// Clones share the same slot, so a test can keep one clone to inspect what
/// the coordinator persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<Vec<CartLine>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `lines`, as if written by an earlier session.
    pub fn with_lines(lines: Vec<CartLine>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(lines))),
        }
    }

    /// Returns the persisted lines without going through the trait.
    pub fn snapshot(&self) -> Option<Vec<CartLine>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl LocalStore for MemoryStore {
    fn read(&self) -> Result<Option<Vec<CartLine>>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn write(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(lines.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartItem;

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let observer = store.clone();
        assert!(store.read().unwrap().is_none());

        let line = CartLine::from_item(CartItem::new("p1", "Mug", 8.0), 1);
        store.write(std::slice::from_ref(&line)).unwrap();
        assert_eq!(observer.snapshot(), Some(vec![line]));

        store.clear().unwrap();
        assert!(observer.snapshot().is_none());
    }
}
