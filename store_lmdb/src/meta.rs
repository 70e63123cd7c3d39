//! LMDB implementation of MetaStore.

use tally_store::{MetaStore, StoreError};

use crate::{LmdbError, LmdbStore};

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

impl MetaStore for LmdbStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("meta key '{}'", key)))?;
        Ok(val.to_vec())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(
                        "schema_version has unexpected byte length".to_string(),
                    )
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
