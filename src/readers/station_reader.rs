use chrono::NaiveDate;
use encoding_rs::Encoding;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::Station;
use crate::utils::{read_decoded, DWD_DATE_FORMAT, STATION_LIST_SKIP_LINES};

// Character offsets of the fixed-width station list, end-exclusive.
const ID: Range<usize> = 0..5;
const FROM_DATE: Range<usize> = 6..14;
const TO_DATE: Range<usize> = 15..23;
const ELEVATION: Range<usize> = 24..38;
const LATITUDE: Range<usize> = 43..51;
const LONGITUDE: Range<usize> = 53..61;
const NAME: Range<usize> = 61..102;
const REGION: Range<usize> = 102..124;

/// Reader for the fixed-width DWD station list
/// (`KL_Tageswerte_Beschreibung_Stationen.txt`).
pub struct StationReader {
    encoding: &'static Encoding,
}

impl StationReader {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Read all stations. The first two lines (header and separator) are
    /// skipped; rows whose id does not parse are dropped.
    pub fn read_stations(&self, path: &Path) -> Result<Vec<Station>> {
        let text = read_decoded(path, self.encoding)?;
        let mut stations = Vec::new();

        for (line_no, line) in text.lines().enumerate().skip(STATION_LIST_SKIP_LINES) {
            if line.trim().is_empty() {
                continue;
            }

            match parse_station_line(line) {
                Some(station) => stations.push(station),
                None => debug!(line = line_no + 1, "Dropping station row without a valid id"),
            }
        }

        Ok(stations)
    }
}

/// Parse one fixed-width row. Unparsable dates and numbers become `None`;
/// an unparsable id rejects the row.
pub fn parse_station_line(line: &str) -> Option<Station> {
    let chars: Vec<char> = line.chars().collect();

    let station_id = field(&chars, ID).parse::<i64>().ok().filter(|id| *id > 0)?;

    Some(Station {
        station_id,
        from_date: parse_date(&field(&chars, FROM_DATE)),
        to_date: parse_date(&field(&chars, TO_DATE)),
        elevation: parse_number(&field(&chars, ELEVATION)),
        latitude: parse_number(&field(&chars, LATITUDE)),
        longitude: parse_number(&field(&chars, LONGITUDE)),
        name: field(&chars, NAME),
        region: field(&chars, REGION),
    })
}

/// Trimmed slice of `chars`; ranges past the end of a short line yield "".
fn field(chars: &[char], range: Range<usize>) -> String {
    let end = range.end.min(chars.len());
    if range.start >= end {
        return String::new();
    }
    chars[range.start..end].iter().collect::<String>().trim().to_string()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DWD_DATE_FORMAT).ok()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[allow(clippy::too_many_arguments)]
    fn fixed_width_line(
        id: &str,
        from: &str,
        to: &str,
        elevation: &str,
        lat: &str,
        lon: &str,
        name: &str,
        region: &str,
    ) -> String {
        format!(
            "{:<5} {:<8} {:<8} {:>14}{:5}{:>8}{:2}{:>8}{:<41}{:<22}",
            id, from, to, elevation, "", lat, "", lon, name, region
        )
    }

    #[test]
    fn test_parse_station_line() {
        let line = fixed_width_line(
            "00044", "19690101", "20240101", "44", "52.9336", "8.2370", "Großenkneten",
            "Niedersachsen",
        );
        let station = parse_station_line(&line).unwrap();

        assert_eq!(station.station_id, 44);
        assert_eq!(station.from_date, NaiveDate::from_ymd_opt(1969, 1, 1));
        assert_eq!(station.to_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(station.elevation, Some(44.0));
        assert_eq!(station.latitude, Some(52.9336));
        assert_eq!(station.longitude, Some(8.2370));
        assert_eq!(station.name, "Großenkneten");
        assert_eq!(station.region, "Niedersachsen");
    }

    #[test]
    fn test_bad_fields_become_none() {
        let line = fixed_width_line("00073", "1969xx01", "", "n/a", "48.6159", "", "Aldersbach", "");
        let station = parse_station_line(&line).unwrap();

        assert_eq!(station.from_date, None);
        assert_eq!(station.to_date, None);
        assert_eq!(station.elevation, None);
        assert_eq!(station.latitude, Some(48.6159));
        assert_eq!(station.longitude, None);
    }

    #[test]
    fn test_short_line_yields_empty_fields() {
        let station = parse_station_line("00001 19370101").unwrap();
        assert_eq!(station.station_id, 1);
        assert_eq!(station.to_date, None);
        assert_eq!(station.name, "");
    }

    #[test]
    fn test_read_stations_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "Stations_id von_datum bis_datum Stationshoehe geoBreite geoLaenge Stationsname Bundesland")?;
        writeln!(temp_file, "----------- --------- --------- ------------- --------- --------- ------------ ----------")?;
        let first = fixed_width_line(
            "00001", "19370101", "19860630", "478", "47.8413", "8.8493", "Aach",
            "Baden-Württemberg",
        );
        let broken = fixed_width_line("xx", "19370101", "19860630", "478", "47.8", "8.8", "Nowhere", "");
        let second = fixed_width_line(
            "00003", "18910101", "20110331", "202", "50.7827", "6.0941", "Aachen",
            "Nordrhein-Westfalen",
        );
        // Station lists are published in ISO-8859-1
        for line in [&first, &broken, &second] {
            let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(line);
            temp_file.write_all(&bytes)?;
            temp_file.write_all(b"\n")?;
        }
        writeln!(temp_file)?;

        let reader = StationReader::new(encoding_rs::WINDOWS_1252);
        let stations = reader.read_stations(temp_file.path())?;

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, 1);
        assert_eq!(stations[0].region, "Baden-Württemberg");
        assert_eq!(stations[1].station_id, 3);
        assert_eq!(stations[1].name, "Aachen");

        Ok(())
    }
}
