//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta table and
//! runs sequential migration steps to bring an older database up to date.

use tally_store::MetaStore;

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Runs database migrations to bring the schema up to date.
pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// - Version 0 means a fresh database (no version stored yet).
    /// - If the stored version matches `CURRENT_SCHEMA_VERSION`, this is a no-op.
    /// - A stored version *higher* than this code supports means the database
    ///   was written by a newer release and is refused.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let current = meta_store.get_schema_version()?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        meta_store.set_schema_version(CURRENT_SCHEMA_VERSION)?;

        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: tables are created on open.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Migration(format!(
            "unknown migration: {} -> {}",
            from, to
        ))),
    }
}
