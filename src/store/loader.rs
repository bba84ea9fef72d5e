use std::path::{Path, PathBuf};

use rusqlite::{Connection, Statement};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::router::{route, TableTarget};
use super::Store;
use crate::error::{ProcessingError, Result};
use crate::models::{Measurement, Station};
use crate::readers::{NormalizedTable, ParameterReader};
use crate::utils::NORMALIZED_DELIMITER;

/// Which insert path produced a `LoadReport`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadPath {
    /// Whole file in one transaction.
    Bulk,
    /// One autocommit insert per row, skipping rejected rows.
    RowByRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub file: PathBuf,
    pub target: TableTarget,
    pub method: LoadPath,
    pub inserted: usize,
    /// Rows rejected while converting or inserting.
    pub skipped: usize,
}

/// A typed row that knows how to bind itself to its table's INSERT.
pub(crate) trait Insertable {
    const INSERT_SQL: &'static str;

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;

    fn key(&self) -> String;
}

impl Insertable for Measurement {
    const INSERT_SQL: &'static str = include_str!("query/insert_measurement.sql");

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(&Store::measurement_params(self))
    }

    fn key(&self) -> String {
        format!("station {} on {}", self.station_id, self.date)
    }
}

impl Insertable for Station {
    const INSERT_SQL: &'static str = include_str!("query/insert_station.sql");

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(&Store::station_params(self))
    }

    fn key(&self) -> String {
        format!("station {}", self.station_id)
    }
}

/// Insert every row inside one transaction. Any failure rolls the whole
/// batch back.
pub(crate) fn bulk_load<T: Insertable>(conn: &mut Connection, rows: &[T]) -> Result<usize> {
    let tx = conn.transaction()?;

    let outcome = (|| -> rusqlite::Result<usize> {
        let mut stmt = tx.prepare(T::INSERT_SQL)?;
        let mut inserted = 0;
        for row in rows {
            inserted += row.insert(&mut stmt)?;
        }
        Ok(inserted)
    })();

    match outcome {
        Ok(inserted) => {
            tx.commit()
                .map_err(|source| ProcessingError::BulkTransferFailure {
                    rows: rows.len(),
                    source,
                })?;
            Ok(inserted)
        }
        Err(source) => {
            tx.rollback()?;
            Err(ProcessingError::BulkTransferFailure {
                rows: rows.len(),
                source,
            })
        }
    }
}

/// Insert rows one at a time, each in its own implicit transaction. Rejected
/// rows are logged and counted, the rest continue. Returns (inserted, skipped).
pub(crate) fn row_load<T: Insertable>(conn: &Connection, rows: &[T]) -> Result<(usize, usize)> {
    let mut stmt = conn.prepare(T::INSERT_SQL)?;
    let mut inserted = 0;
    let mut skipped = 0;

    for row in rows {
        match row.insert(&mut stmt).map_err(ProcessingError::from_insert) {
            Ok(n) => inserted += n,
            Err(ProcessingError::ConstraintViolation(msg)) => {
                debug!(row = %row.key(), reason = %msg, "Skipping duplicate row");
                skipped += 1;
            }
            Err(e) => {
                warn!(row = %row.key(), error = %e, "Skipping row that failed to insert");
                skipped += 1;
            }
        }
    }

    Ok((inserted, skipped))
}

/// Routes normalized files to their table and loads them.
pub struct TableLoader<'a> {
    store: &'a mut Store,
}

impl<'a> TableLoader<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// Load one normalized file. Measurements try the bulk path first and fall
    /// back to row-by-row inserts when the batch is rejected.
    pub fn load(&mut self, path: &Path) -> Result<LoadReport> {
        let table = NormalizedTable::open(path)?;
        let target = route(path, table.header())?;
        debug!(file = %path.display(), %target, rows = table.len(), "Routing file");

        let report = match target {
            TableTarget::Measurement => self.load_measurements(path, &table)?,
            TableTarget::Station => {
                let batch = table.stations();
                let (inserted, skipped) = row_load(self.store.connection(), &batch.rows)?;
                LoadReport {
                    file: path.to_path_buf(),
                    target,
                    method: LoadPath::RowByRow,
                    inserted,
                    skipped: skipped + batch.skipped,
                }
            }
            TableTarget::Parameter => {
                let parameters = ParameterReader::new(encoding_rs::UTF_8, NORMALIZED_DELIMITER)
                    .read_parameters(path)?;
                let mut inserted = 0;
                for parameter in &parameters {
                    if self.store.insert_parameter_or_ignore(parameter)? {
                        inserted += 1;
                    }
                }
                LoadReport {
                    file: path.to_path_buf(),
                    target,
                    method: LoadPath::RowByRow,
                    inserted,
                    skipped: parameters.len() - inserted,
                }
            }
        };

        info!(
            file = %path.display(),
            target = %report.target,
            method = ?report.method,
            inserted = report.inserted,
            skipped = report.skipped,
            "Loaded file"
        );
        Ok(report)
    }

    fn load_measurements(&mut self, path: &Path, table: &NormalizedTable) -> Result<LoadReport> {
        let batch = table.measurements();

        let (method, inserted, skipped) =
            match bulk_load(self.store.connection_mut(), &batch.rows) {
                Ok(inserted) => (LoadPath::Bulk, inserted, 0),
                Err(ProcessingError::BulkTransferFailure { rows, source }) => {
                    warn!(
                        file = %path.display(),
                        rows,
                        error = %source,
                        "Bulk load rejected, falling back to row-by-row inserts"
                    );
                    let (inserted, skipped) = row_load(self.store.connection(), &batch.rows)?;
                    (LoadPath::RowByRow, inserted, skipped)
                }
                Err(e) => return Err(e),
            };

        Ok(LoadReport {
            file: path.to_path_buf(),
            target: TableTarget::Measurement,
            method,
            inserted,
            skipped: skipped + batch.skipped,
        })
    }
}
