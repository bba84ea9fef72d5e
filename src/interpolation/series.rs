use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub date: NaiveDate,
    /// One value per parameter, in header order.
    pub values: Vec<Option<f64>>,
}

/// Interpolated values over a date range. Days without any data are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    /// `date` followed by the parameter codes.
    pub header: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn new(codes: &[String]) -> Self {
        let mut header = Vec::with_capacity(codes.len() + 1);
        header.push("date".to_string());
        header.extend(codes.iter().cloned());
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write as CSV; missing values are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.header)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_csv() -> Result<()> {
        let mut table = SeriesTable::new(&["TMK".to_string(), "RSK".to_string()]);
        table.rows.push(SeriesRow {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            values: vec![Some(3.5), None],
        });
        table.rows.push(SeriesRow {
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            values: vec![Some(-1.0), Some(0.2)],
        });

        let mut out = Vec::new();
        table.write_csv(&mut out)?;

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,TMK,RSK\n2023-01-01,3.5,\n2023-01-02,-1,0.2\n"
        );
        Ok(())
    }
}
