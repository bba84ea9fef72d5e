use encoding_rs::Encoding;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::Parameter;
use crate::utils::{read_decoded, COL_PARAMETER, COL_PARAMETER_DESCRIPTION, COL_UNIT};

/// Reader for `Metadaten_Parameter_*` files: one row per parameter and
/// validity period, followed by a free-text legend.
pub struct ParameterReader {
    encoding: &'static Encoding,
    delimiter: u8,
}

impl ParameterReader {
    pub fn new(encoding: &'static Encoding, delimiter: u8) -> Self {
        Self {
            encoding,
            delimiter,
        }
    }

    pub fn read_parameters(&self, path: &Path) -> Result<Vec<Parameter>> {
        let text = read_decoded(path, self.encoding)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Column '{}' missing from parameter file '{}'",
                    name,
                    path.display()
                ))
            })
        };
        let code_idx = column(COL_PARAMETER)?;
        let description_idx = column(COL_PARAMETER_DESCRIPTION)?;
        let unit_idx = column(COL_UNIT)?;
        let needed = code_idx.max(description_idx).max(unit_idx) + 1;

        let mut parameters = Vec::new();
        for (row_no, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < needed {
                debug!(row = row_no + 1, "Skipping short parameter row");
                continue;
            }
            let code = &record[code_idx];
            if code.is_empty() {
                continue;
            }
            parameters.push(Parameter::new(
                code,
                &record[description_idx],
                &record[unit_idx],
            ));
        }

        Ok(parameters)
    }
}
