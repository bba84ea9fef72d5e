use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Measurement, Station};
use crate::utils::{
    COL_END_OF_RECORD, COL_MESS_DATUM, COL_STATIONS_ID, DWD_DATE_FORMAT, MEASUREMENT_FIELDS,
    NORMALIZED_DELIMITER,
};

/// Rows converted from a normalized file, plus how many were rejected.
#[derive(Debug)]
pub struct RowBatch<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for RowBatch<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: 0,
        }
    }
}

/// A normalized (UTF-8, comma separated, header first) table held in memory.
pub struct NormalizedTable {
    path: PathBuf,
    header: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl NormalizedTable {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(NORMALIZED_DELIMITER)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let header = reader.headers()?.iter().map(str::to_string).collect();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            header,
            records,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Convert rows to measurements. `STATIONS_ID` and `MESS_DATUM` are
    /// required per row; `eor` and unknown columns are ignored.
    pub fn measurements(&self) -> RowBatch<Measurement> {
        let station_idx = self.position(|h| h.eq_ignore_ascii_case(COL_STATIONS_ID));
        let date_idx = self.position(|h| h.eq_ignore_ascii_case(COL_MESS_DATUM));

        let mut value_columns: Vec<(usize, &str)> = Vec::new();
        for (idx, name) in self.header.iter().enumerate() {
            if Some(idx) == station_idx
                || Some(idx) == date_idx
                || name.eq_ignore_ascii_case(COL_END_OF_RECORD)
            {
                continue;
            }
            if MEASUREMENT_FIELDS.contains(&name.to_ascii_lowercase().as_str()) {
                value_columns.push((idx, name.as_str()));
            } else {
                debug!(column = %name, "Ignoring unknown measurement column");
            }
        }

        let mut batch = RowBatch::default();
        for (row_no, record) in self.records.iter().enumerate() {
            let station_id = station_idx
                .and_then(|i| record.get(i))
                .and_then(parse_station_id);
            let date = date_idx.and_then(|i| record.get(i)).and_then(parse_date);

            let (Some(station_id), Some(date)) = (station_id, date) else {
                warn!(
                    path = %self.path.display(),
                    row = row_no + 1,
                    "Skipping measurement row without station id or date"
                );
                batch.skipped += 1;
                continue;
            };

            let mut measurement = Measurement::new(station_id, date);
            for &(idx, name) in &value_columns {
                measurement.set_from_str(name, record.get(idx).unwrap_or(""));
            }
            batch.rows.push(measurement);
        }

        batch
    }

    /// Convert rows of a station description file (`Stationsname` header).
    pub fn stations(&self) -> RowBatch<Station> {
        let id_idx = self.position(|h| {
            h.eq_ignore_ascii_case(COL_STATIONS_ID) || h.eq_ignore_ascii_case("station_id")
        });
        let from_idx = self.position(|h| h.eq_ignore_ascii_case("von_datum"));
        let to_idx = self.position(|h| h.eq_ignore_ascii_case("bis_datum"));
        let elevation_idx = self.position(|h| h.to_ascii_lowercase().contains("hoehe"));
        let lat_idx = self.position(|h| h.to_ascii_lowercase().contains("breite"));
        let lon_idx = self.position(|h| h.to_ascii_lowercase().contains("laenge"));
        let name_idx = self.position(|h| h.eq_ignore_ascii_case("stationsname"));
        let region_idx = self.position(|h| h.eq_ignore_ascii_case("bundesland"));

        let mut batch = RowBatch::default();
        for (row_no, record) in self.records.iter().enumerate() {
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

            let Some(station_id) = parse_station_id(cell(id_idx)) else {
                warn!(
                    path = %self.path.display(),
                    row = row_no + 1,
                    "Skipping station row without a valid id"
                );
                batch.skipped += 1;
                continue;
            };

            batch.rows.push(Station {
                station_id,
                from_date: parse_date(cell(from_idx)),
                to_date: parse_date(cell(to_idx)),
                elevation: parse_number(cell(elevation_idx)),
                latitude: parse_number(cell(lat_idx)),
                longitude: parse_number(cell(lon_idx)),
                name: cell(name_idx).to_string(),
                region: cell(region_idx).to_string(),
            });
        }

        batch
    }

    fn position(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.header.iter().position(|h| pred(h))
    }
}

fn parse_station_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0)
                .map(|v| v as i64)
        })
        .filter(|id| *id > 0)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DWD_DATE_FORMAT).ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(lines: &[&str]) -> Result<(NamedTempFile, NormalizedTable)> {
        let mut file = NamedTempFile::new()?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        let table = NormalizedTable::open(file.path())?;
        Ok((file, table))
    }

    #[test]
    fn test_measurement_rows() -> Result<()> {
        let (_file, table) = table(&[
            "STATIONS_ID,MESS_DATUM,QN_3,FX,RSKF,TMK,EXTRA,eor",
            "44,20230101,10,12.5,6,3.4,x,eor",
            "44,20230102,,,,,,eor",
        ])?;

        let batch = table.measurements();
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.rows.len(), 2);

        let mut expected = Measurement::new(44, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        expected.qn_3 = Some(10);
        expected.fx = Some(12.5);
        expected.rskf = Some(6);
        expected.tmk = Some(3.4);
        assert_eq!(batch.rows[0], expected);

        assert_eq!(batch.rows[1].tmk, None);
        assert!(!batch.rows[1].has_values());
        Ok(())
    }

    #[test]
    fn test_rows_without_key_are_skipped() -> Result<()> {
        let (_file, table) = table(&[
            "STATIONS_ID,MESS_DATUM,TMK",
            ",20230101,1.0",
            "44,2023-13-01,1.0",
            "44,20230103,1.0",
        ])?;

        let batch = table.measurements();
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.rows.len(), 1);
        Ok(())
    }

    #[test]
    fn test_station_rows() -> Result<()> {
        let (_file, table) = table(&[
            "Stations_id,Stationshoehe,Geogr.Breite,Geogr.Laenge,von_datum,bis_datum,Stationsname",
            "44,44.0,52.9336,8.2370,19690101,,Großenkneten",
            "abc,1,1,1,,,Broken",
        ])?;

        let batch = table.stations();
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.rows.len(), 1);

        let station = &batch.rows[0];
        assert_eq!(station.station_id, 44);
        assert_eq!(station.latitude, Some(52.9336));
        assert_eq!(station.to_date, None);
        assert_eq!(station.name, "Großenkneten");
        Ok(())
    }
}
