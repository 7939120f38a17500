use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{LocalStore, StoreError, DEFAULT_STORE_KEY};
use crate::model::CartLine;

/// [`LocalStore`] backed by a JSON file `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store using the default `"cart"` key inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_key(dir, DEFAULT_STORE_KEY)
    }

    pub fn with_key(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStore for FileStore {
    fn read(&self) -> Result<Option<Vec<CartLine>>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let lines: Vec<CartLine> = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), lines = lines.len(), "Read cart");
        Ok(Some(lines))
    }

    fn write(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec(lines)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), lines = lines.len(), "Wrote cart");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CartItem;
    use tempfile::tempdir;

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_preserves_order() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let lines = vec![
            CartLine::from_item(CartItem::new("p2", "Cap", 12.0).with_color("red"), 1),
            CartLine::from_item(CartItem::new("p1", "Tee", 20.0).with_size("M"), 3),
        ];
        store.write(&lines).unwrap();
        assert_eq!(store.read().unwrap(), Some(lines));
        assert!(store.path().ends_with("nested/cart.json"));
    }

    #[test]
    fn test_clear_removes_document_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_key(dir.path(), "guest");
        store.write(&[]).unwrap();
        assert!(store.path().exists());
        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.read(), Err(StoreError::Serde(_))));
    }
}
