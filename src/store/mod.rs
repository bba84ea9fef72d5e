//! The relational store: station, parameter and measurement tables in SQLite.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};

mod importers;
mod loader;
mod query;
mod router;

pub use importers::{ParameterImporter, StationImporter};
pub use loader::{LoadPath, LoadReport, TableLoader};
pub use router::{route, TableTarget};

const EMBEDDED_SCHEMA: &str = include_str!("schema.sql");

/// Handle on the SQLite database holding all ingested data.
#[derive(Debug)]
pub struct Store {
    db_conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and apply the schema.
    ///
    /// `schema_override` replaces the embedded DDL. Failing to open the file,
    /// read the override or apply the schema is fatal for the caller.
    pub fn open(path: &Path, schema_override: Option<&Path>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db_conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|source| ProcessingError::StoreOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::prepare(db_conn, path, schema_override)?;
        info!(path = %path.display(), "Opened store");
        Ok(store)
    }

    /// A throwaway store, used by tests and benchmarks.
    pub fn open_in_memory() -> Result<Self> {
        let db_conn = Connection::open_in_memory().map_err(|source| ProcessingError::StoreOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::prepare(db_conn, Path::new(":memory:"), None)
    }

    /// Measurements may arrive before their station, so the `REFERENCES`
    /// clause is documentation only. The bundled SQLite enforces foreign keys
    /// by default, hence the explicit pragma.
    fn prepare(
        db_conn: Connection,
        db_path: &Path,
        schema_override: Option<&Path>,
    ) -> Result<Self> {
        db_conn
            .pragma_update(None, "foreign_keys", false)
            .map_err(|source| ProcessingError::StoreOpen {
                path: db_path.to_path_buf(),
                source,
            })?;

        let store = Store { db_conn };
        store.apply_schema(db_path, schema_override)?;
        Ok(store)
    }

    fn apply_schema(&self, db_path: &Path, schema_override: Option<&Path>) -> Result<()> {
        let ddl = match schema_override {
            Some(schema_path) => {
                debug!(schema = %schema_path.display(), "Using schema override");
                std::fs::read_to_string(schema_path).map_err(|source| {
                    ProcessingError::SchemaFile {
                        path: schema_path.to_path_buf(),
                        source,
                    }
                })?
            }
            None => EMBEDDED_SCHEMA.to_string(),
        };

        self.db_conn
            .execute_batch(&ddl)
            .map_err(|source| ProcessingError::StoreOpen {
                path: db_path.to_path_buf(),
                source,
            })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.db_conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.db_conn
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_schema_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("weather.db");

        drop(Store::open(&path, None)?);
        let store = Store::open(&path, None)?;
        assert_eq!(store.count_stations()?, 0);
        assert_eq!(store.count_measurements()?, 0);
        Ok(())
    }

    #[test]
    fn test_foreign_keys_are_not_enforced() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let on_disk = Store::open(&dir.path().join("weather.db"), None)?;
        let in_memory = Store::open_in_memory()?;

        for store in [on_disk, in_memory] {
            let enforced: i64 = store
                .connection()
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
            assert_eq!(enforced, 0);
        }
        Ok(())
    }

    #[test]
    fn test_missing_schema_override_is_fatal() {
        let err = Store::open(Path::new(":memory:"), Some(Path::new("/no/such/schema.sql")))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::SchemaFile { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_schema_override_is_applied() -> Result<()> {
        let mut schema = tempfile::NamedTempFile::new()?;
        write!(schema, "{}", EMBEDDED_SCHEMA)?;
        writeln!(schema, "CREATE TABLE IF NOT EXISTS extra (id INTEGER);")?;

        let dir = tempfile::tempdir()?;
        let store = Store::open(&dir.path().join("weather.db"), Some(schema.path()))?;
        let tables: i64 = store.connection().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'extra'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(tables, 1);
        Ok(())
    }
}
