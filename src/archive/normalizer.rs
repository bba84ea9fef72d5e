use encoding_rs::Encoding;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::settings::SourceSettings;
use crate::utils::{encoding_for_label, read_decoded, NORMALIZED_DELIMITER};

/// Turns an extracted DWD text file into a clean UTF-8 CSV.
///
/// Lines before the header (located by keyword) are discarded, header names
/// and cells are trimmed, sentinel cells become empty and blank rows are
/// dropped.
pub struct Normalizer {
    header_keyword: String,
    delimiter: u8,
    na_value: String,
    na_numeric: Option<f64>,
    encoding: &'static Encoding,
}

impl Normalizer {
    pub fn new(
        header_keyword: &str,
        delimiter: u8,
        na_value: &str,
        encoding: &'static Encoding,
    ) -> Self {
        let na_value = na_value.trim().to_string();
        let na_numeric = na_value.parse::<f64>().ok();
        Self {
            header_keyword: header_keyword.to_string(),
            delimiter,
            na_value,
            na_numeric,
            encoding,
        }
    }

    pub fn from_settings(source: &SourceSettings) -> Result<Self> {
        Ok(Self::new(
            &source.header_keyword,
            source.delimiter_byte()?,
            &source.na_value,
            encoding_for_label(&source.file_encoding)?,
        ))
    }

    /// Normalize `path` and return the `.csv` written next to it. The source
    /// file is removed once the output exists.
    pub fn normalize(&self, path: &Path) -> Result<PathBuf> {
        let text = read_decoded(path, self.encoding)?;

        let header_start = find_line_offset(&text, &self.header_keyword).ok_or_else(|| {
            ProcessingError::HeaderNotFound {
                path: path.to_path_buf(),
                keyword: self.header_keyword.clone(),
            }
        })?;
        let body = &text[header_start..];

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let output_path = path.with_extension("csv");
        let mut rows = Vec::new();
        let mut dropped = 0usize;

        for (row_no, record) in reader.records().enumerate() {
            let record = record?;
            if row_no > 0 && record.iter().all(str::is_empty) {
                dropped += 1;
                continue;
            }
            let cells: Vec<String> = if row_no == 0 {
                record.iter().map(str::to_string).collect()
            } else {
                record
                    .iter()
                    .map(|cell| {
                        if self.is_missing(cell) {
                            String::new()
                        } else {
                            cell.to_string()
                        }
                    })
                    .collect()
            };
            rows.push(cells);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(NORMALIZED_DELIMITER)
            .flexible(true)
            .from_path(&output_path)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        if output_path != path {
            std::fs::remove_file(path)?;
        }

        debug!(
            source = %path.display(),
            output = %output_path.display(),
            rows = rows.len().saturating_sub(1),
            dropped,
            "Normalized file"
        );
        Ok(output_path)
    }

    /// A cell is missing if it equals the sentinel textually, or numerically
    /// (`-999.0` for `-999`).
    fn is_missing(&self, cell: &str) -> bool {
        if cell == self.na_value {
            return true;
        }
        match (self.na_numeric, cell.parse::<f64>()) {
            (Some(na), Ok(value)) => value == na,
            _ => false,
        }
    }
}

/// Byte offset of the first line containing `keyword`.
fn find_line_offset(text: &str, keyword: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.contains(keyword) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn normalizer() -> Normalizer {
        Normalizer::new("STATIONS_ID", b';', "-999", encoding_rs::WINDOWS_1252)
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path)?;
        file.write_all(content)?;
        Ok(path)
    }

    #[test]
    fn test_normalize_product_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = write_file(
            dir.path(),
            "produkt_klima_tag_00044.txt",
            b"preamble line\n\
              STATIONS_ID;MESS_DATUM;QN_3;  FX; TMK;eor\n\
              \x20        44;20230101;   10;-999;  3.4;eor\n\
              \n\
              \x20        44;20230102;   10;12.0;-999.0;eor\n",
        )?;

        let output = normalizer().normalize(&source)?;

        assert_eq!(output, dir.path().join("produkt_klima_tag_00044.csv"));
        assert!(!source.exists());
        assert_eq!(
            std::fs::read_to_string(&output)?,
            "STATIONS_ID,MESS_DATUM,QN_3,FX,TMK,eor\n\
             44,20230101,10,,3.4,eor\n\
             44,20230102,10,12.0,,eor\n"
        );
        Ok(())
    }

    #[test]
    fn test_latin1_is_reencoded() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = write_file(
            dir.path(),
            "Metadaten_Parameter_00044.txt",
            b"STATIONS_ID;Stationsname\n44;Gro\xdfenkneten\n",
        )?;

        let output = normalizer().normalize(&source)?;
        assert_eq!(
            std::fs::read_to_string(output)?,
            "STATIONS_ID,Stationsname\n44,Großenkneten\n"
        );
        Ok(())
    }

    #[test]
    fn test_missing_header() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = write_file(dir.path(), "produkt_x.txt", b"no;header;here\n1;2;3\n")?;

        let err = normalizer().normalize(&source).unwrap_err();
        assert!(matches!(err, ProcessingError::HeaderNotFound { .. }));
        assert!(source.exists());
        Ok(())
    }

    #[test]
    fn test_sentinel_matching() {
        let n = normalizer();
        assert!(n.is_missing("-999"));
        assert!(n.is_missing("-999.0"));
        assert!(!n.is_missing("-99.9"));
        assert!(!n.is_missing(""));
        assert!(!n.is_missing("0"));
    }

    #[test]
    fn test_find_line_offset() {
        assert_eq!(find_line_offset("a\nb KEY\n", "KEY"), Some(2));
        assert_eq!(find_line_offset("a\nb\n", "KEY"), None);
    }
}
