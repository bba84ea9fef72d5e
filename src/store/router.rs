use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{ProcessingError, Result};
use crate::utils::{
    COL_MESS_DATUM, COL_PARAMETER, COL_PARAMETER_DESCRIPTION, COL_STATIONSNAME, COL_STATIONS_ID,
    COL_UNIT,
};

/// Table a normalized file is loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableTarget {
    Measurement,
    Station,
    Parameter,
}

impl fmt::Display for TableTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableTarget::Measurement => write!(f, "measurement"),
            TableTarget::Station => write!(f, "station"),
            TableTarget::Parameter => write!(f, "parameter"),
        }
    }
}

/// Decide the target table from a file's header.
///
/// Rules are checked in order; the parameter rule precedes the station rule
/// because DWD parameter files also carry a `Stationsname` column.
pub fn route(path: &Path, header: &[String]) -> Result<TableTarget> {
    let has = |column: &str| header.iter().any(|h| h.trim() == column);

    if has(COL_MESS_DATUM) && has(COL_STATIONS_ID) {
        Ok(TableTarget::Measurement)
    } else if has(COL_PARAMETER) && has(COL_PARAMETER_DESCRIPTION) && has(COL_UNIT) {
        Ok(TableTarget::Parameter)
    } else if has(COL_STATIONSNAME) {
        Ok(TableTarget::Station)
    } else {
        Err(ProcessingError::UnroutableFile {
            path: path.to_path_buf(),
            header: header.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn route_columns(columns: &[&str]) -> Result<TableTarget> {
        route(Path::new("file.csv"), &header(columns))
    }

    #[test]
    fn test_measurement_wins_over_station() {
        let target = route_columns(&["STATIONS_ID", "MESS_DATUM", "TMK", "Stationsname"]).unwrap();
        assert_eq!(target, TableTarget::Measurement);
    }

    #[test]
    fn test_parameter_file_with_station_name() {
        let target = route_columns(&[
            "Stations_ID",
            "Von_Datum",
            "Bis_Datum",
            "Stationsname",
            "Parameter",
            "Parameterbeschreibung",
            "Einheit",
        ])
        .unwrap();
        assert_eq!(target, TableTarget::Parameter);
    }

    #[test]
    fn test_station_file() {
        let target = route_columns(&["Stations_id", "Stationshoehe", "Stationsname"]).unwrap();
        assert_eq!(target, TableTarget::Station);
    }

    #[test]
    fn test_unroutable_file() {
        let err = route_columns(&["A", "B"]).unwrap_err();
        assert!(matches!(err, ProcessingError::UnroutableFile { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_date_without_station_id_is_not_measurement() {
        let err = route_columns(&["MESS_DATUM", "TMK"]).unwrap_err();
        assert!(matches!(err, ProcessingError::UnroutableFile { .. }));
    }
}
