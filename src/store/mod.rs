//! Local persistence of the cart line list.
//!
//! The coordinator only needs three operations from a store, captured by the
//! [`LocalStore`] trait. Two adapters are provided:
//!
//! - [`MemoryStore`]: cloneable in-memory store, handy in tests.
//! - [`FileStore`]: one JSON document per store key on disk.

pub mod error;
pub mod file;
pub mod memory;

pub use error::*;
pub use file::*;
pub use memory::*;

use crate::model::CartLine;

/// Key under which the cart line list is persisted.
pub const DEFAULT_STORE_KEY: &str = "cart";

/// Key-value persistence of a single ordered cart line list.
///
/// `read` returns `Ok(None)` when nothing has been written yet (or after
/// `clear`).
pub trait LocalStore: Send + Sync {
    fn read(&self) -> Result<Option<Vec<CartLine>>, StoreError>;

    fn write(&self, lines: &[CartLine]) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

impl<S: LocalStore + ?Sized> LocalStore for std::sync::Arc<S> {
    fn read(&self) -> Result<Option<Vec<CartLine>>, StoreError> {
        (**self).read()
    }

    fn write(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        (**self).write(lines)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}
