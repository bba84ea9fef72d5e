use std::path::Path;

use encoding_rs::Encoding;
use tracing::info;

use super::Store;
use crate::error::Result;
use crate::readers::{ParameterReader, StationReader};
use crate::utils::PARAMETER_FILE_DELIMITER;

/// Imports the fixed-width station master list. Existing stations are never
/// updated.
pub struct StationImporter<'a> {
    store: &'a Store,
    reader: StationReader,
}

impl<'a> StationImporter<'a> {
    pub fn new(store: &'a Store, encoding: &'static Encoding) -> Self {
        Self {
            store,
            reader: StationReader::new(encoding),
        }
    }

    /// Returns the number of newly inserted stations.
    pub fn import(&self, path: &Path) -> Result<usize> {
        let stations = self.reader.read_stations(path)?;
        let mut inserted = 0;
        for station in &stations {
            if self.store.insert_station_or_ignore(station)? {
                inserted += 1;
            }
        }

        info!(
            file = %path.display(),
            read = stations.len(),
            inserted,
            "Imported station list"
        );
        Ok(inserted)
    }
}

/// Imports `Metadaten_Parameter` members. Codes already present are skipped.
pub struct ParameterImporter<'a> {
    store: &'a Store,
    reader: ParameterReader,
}

impl<'a> ParameterImporter<'a> {
    pub fn new(store: &'a Store, encoding: &'static Encoding) -> Self {
        Self {
            store,
            reader: ParameterReader::new(encoding, PARAMETER_FILE_DELIMITER),
        }
    }

    /// Returns the number of newly inserted parameter codes.
    pub fn import(&self, path: &Path) -> Result<usize> {
        let parameters = self.reader.read_parameters(path)?;
        let mut inserted = 0;
        for parameter in &parameters {
            if self.store.insert_parameter_or_ignore(parameter)? {
                inserted += 1;
            }
        }

        info!(file = %path.display(), inserted, "Imported parameters");
        Ok(inserted)
    }
}
