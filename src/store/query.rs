use chrono::NaiveDate;
use rusqlite::{params, types::ToSql, OptionalExtension, Row};

use super::Store;
use crate::error::{ProcessingError, Result};
use crate::models::{Measurement, Parameter, Station};

impl Store {
    /// All stations, ordered by id.
    pub fn stations(&self) -> Result<Vec<Station>> {
        let mut stmt = self
            .connection()
            .prepare(include_str!("query/select_stations.sql"))?;

        let stations = stmt
            .query_map([], Self::parse_row_to_station)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stations)
    }

    /// All parameters, ordered by code.
    pub fn parameters(&self) -> Result<Vec<Parameter>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT code, description, unit FROM parameter ORDER BY code")?;

        let parameters = stmt
            .query_map([], |row| {
                Ok(Parameter {
                    code: row.get(0)?,
                    description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    unit: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(parameters)
    }

    /// The measurement row of one station for one day, if it exists.
    pub fn measurement(&self, station_id: i64, date: NaiveDate) -> Result<Option<Measurement>> {
        self.connection()
            .query_row(
                include_str!("query/select_measurement.sql"),
                params![station_id, date],
                Self::parse_row_to_measurement,
            )
            .optional()
            .map_err(ProcessingError::from)
    }

    pub fn count_stations(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM station")
    }

    pub fn count_parameters(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM parameter")
    }

    pub fn count_measurements(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM measurement")
    }

    fn count(&self, sql: &str) -> Result<i64> {
        Ok(self.connection().query_row(sql, [], |row| row.get(0))?)
    }

    /// Insert a station unless its id already exists. Returns whether a row
    /// was written.
    pub fn insert_station_or_ignore(&self, station: &Station) -> Result<bool> {
        let changed = self
            .connection()
            .prepare_cached(include_str!("query/insert_station_or_ignore.sql"))?
            .execute(&Self::station_params(station))?;
        Ok(changed == 1)
    }

    /// Insert a parameter unless its code already exists. Returns whether a
    /// row was written.
    pub fn insert_parameter_or_ignore(&self, parameter: &Parameter) -> Result<bool> {
        let changed = self.connection().execute(
            "INSERT OR IGNORE INTO parameter (code, description, unit) VALUES (?1, ?2, ?3)",
            params![parameter.code, parameter.description, parameter.unit],
        )?;
        Ok(changed == 1)
    }

    pub(crate) fn station_params(station: &Station) -> [&dyn ToSql; 8] {
        [
            &station.station_id,
            &station.from_date,
            &station.to_date,
            &station.elevation,
            &station.latitude,
            &station.longitude,
            &station.name,
            &station.region,
        ]
    }

    pub(crate) fn measurement_params(m: &Measurement) -> [&dyn ToSql; 18] {
        [
            &m.station_id,
            &m.date,
            &m.qn_3,
            &m.fx,
            &m.fm,
            &m.qn_4,
            &m.rsk,
            &m.rskf,
            &m.sdk,
            &m.shk_tag,
            &m.nm,
            &m.vpm,
            &m.pm,
            &m.tmk,
            &m.upm,
            &m.txk,
            &m.tnk,
            &m.tgk,
        ]
    }

    fn parse_row_to_station(row: &Row) -> std::result::Result<Station, rusqlite::Error> {
        Ok(Station {
            station_id: row.get(0)?,
            from_date: row.get(1)?,
            to_date: row.get(2)?,
            elevation: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            name: row.get(6)?,
            region: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        })
    }

    fn parse_row_to_measurement(row: &Row) -> std::result::Result<Measurement, rusqlite::Error> {
        Ok(Measurement {
            station_id: row.get(0)?,
            date: row.get(1)?,
            qn_3: row.get(2)?,
            fx: row.get(3)?,
            fm: row.get(4)?,
            qn_4: row.get(5)?,
            rsk: row.get(6)?,
            rskf: row.get(7)?,
            sdk: row.get(8)?,
            shk_tag: row.get(9)?,
            nm: row.get(10)?,
            vpm: row.get(11)?,
            pm: row.get(12)?,
            tmk: row.get(13)?,
            upm: row.get(14)?,
            txk: row.get(15)?,
            tnk: row.get(16)?,
            tgk: row.get(17)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: i64) -> Station {
        Station {
            station_id: id,
            from_date: NaiveDate::from_ymd_opt(1937, 1, 1),
            to_date: None,
            elevation: Some(202.0),
            latitude: Some(50.7827),
            longitude: Some(6.0941),
            name: "Aachen".to_string(),
            region: "Nordrhein-Westfalen".to_string(),
        }
    }

    #[test]
    fn test_station_insert_ignores_duplicates() -> Result<()> {
        let store = Store::open_in_memory()?;
        assert!(store.insert_station_or_ignore(&station(3))?);

        let mut renamed = station(3);
        renamed.name = "Changed".to_string();
        assert!(!store.insert_station_or_ignore(&renamed)?);

        let stations = store.stations()?;
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0], station(3));
        Ok(())
    }

    #[test]
    fn test_parameter_insert_ignores_duplicates() -> Result<()> {
        let store = Store::open_in_memory()?;
        let tmk = Parameter::new("TMK", "Tagesmittel der Temperatur", "°C");
        assert!(store.insert_parameter_or_ignore(&tmk)?);
        assert!(!store.insert_parameter_or_ignore(&Parameter::new("TMK", "other", "K"))?);
        assert_eq!(store.parameters()?, vec![tmk]);
        Ok(())
    }

    #[test]
    fn test_measurement_nulls_survive() -> Result<()> {
        let store = Store::open_in_memory()?;
        let date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let mut m = Measurement::new(3, date);
        m.tmk = Some(4.5);
        m.qn_3 = Some(10);

        store
            .connection()
            .execute(
                include_str!("query/insert_measurement.sql"),
                &Store::measurement_params(&m),
            )?;

        let stored = store.measurement(3, date)?.unwrap();
        assert_eq!(stored, m);
        assert_eq!(stored.rsk, None);
        assert!(store.measurement(3, date.succ_opt().unwrap())?.is_none());
        Ok(())
    }
}
