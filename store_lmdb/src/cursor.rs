//! LMDB implementation of CursorStore.
//!
//! Values are stored as decimal text under the cursor name.

use tally_store::cursor::{decode_cursor, encode_cursor};
use tally_store::{CursorStore, StoreError};

use crate::{LmdbError, LmdbStore};

impl CursorStore for LmdbStore {
    fn get_cursor(&self, name: &str) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .cursors_db
            .get(&rtxn, name.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("cursor '{name}'")))?;
        decode_cursor(name, val)
    }

    fn put_cursor(&self, name: &str, value: u64) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.cursors_db
            .put(&mut wtxn, name.as_bytes(), encode_cursor(value).as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), 8, 10 * 1024 * 1024).expect("open");
        (dir, store)
    }

    #[test]
    fn missing_cursor_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.get_cursor("proposal_start:314").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn put_overwrites_unconditionally() {
        let (_dir, store) = temp_store();
        store.put_cursor("proposal_start:314", 9).unwrap();
        store.put_cursor("proposal_start:314", 4).unwrap();
        assert_eq!(store.get_cursor("proposal_start:314").unwrap(), 4);
    }

    #[test]
    fn value_is_stored_as_text() {
        let (_dir, store) = temp_store();
        store.put_cursor("k", 123).unwrap();
        let rtxn = store.env.read_txn().unwrap();
        let raw = store.cursors_db.get(&rtxn, b"k".as_slice()).unwrap().unwrap();
        assert_eq!(raw, b"123");
    }
}
