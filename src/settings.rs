//! Runtime configuration.
//!
//! Settings are assembled once from built-in defaults, an optional config file
//! and `DWD_`-prefixed environment variables (`DWD_DATABASE__PATH=...`), then
//! validated and handed to each component's constructor.

use crate::error::{ProcessingError, Result};
use crate::utils::encoding_for_label;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "dwd-climate.toml";
const ENV_PREFIX: &str = "DWD";
const DWD_DAILY_KL_URL: &str =
    "https://opendata.dwd.de/climate_environment/CDC/observations_germany/climate/daily/kl/historical/";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(nested)]
    pub source: SourceSettings,
    pub paths: PathSettings,
    pub database: DatabaseSettings,
    #[validate(nested)]
    pub interpolation: InterpolationSettings,
    #[validate(nested)]
    pub geocoder: GeocoderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory listing that holds the daily archives.
    #[validate(url)]
    pub base_url: String,
    /// Fixed-width station master file.
    #[validate(url)]
    pub station_list_url: String,
    /// Substring an archive name must contain to be fetched.
    #[validate(length(min = 1))]
    pub archive_pattern: String,
    /// Substring selecting the measurement member inside an archive.
    #[validate(length(min = 1))]
    pub product_member_pattern: String,
    /// Substring selecting the parameter metadata member inside an archive.
    #[validate(length(min = 1))]
    pub parameter_member_pattern: String,
    #[validate(length(min = 1))]
    pub header_keyword: String,
    pub delimiter: char,
    pub na_value: String,
    #[validate(length(min = 1))]
    pub file_encoding: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: DWD_DAILY_KL_URL.to_string(),
            station_list_url: format!("{}KL_Tageswerte_Beschreibung_Stationen.txt", DWD_DAILY_KL_URL),
            archive_pattern: "tageswerte_KL_".to_string(),
            product_member_pattern: "produkt_".to_string(),
            parameter_member_pattern: "Metadaten_Parameter".to_string(),
            header_keyword: "STATIONS_ID".to_string(),
            delimiter: ';',
            na_value: "-999".to_string(),
            file_encoding: "latin1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub download_dir: PathBuf,
    pub extract_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("data"),
            extract_dir: PathBuf::from("data/unzipped"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    /// Replaces the embedded DDL when set. A missing file is fatal.
    pub schema_file: Option<PathBuf>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/weather.db"),
            schema_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct InterpolationSettings {
    #[validate(range(min = 1, max = 100))]
    pub neighbours: usize,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self { neighbours: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeocoderSettings {
    #[validate(url)]
    pub endpoint: String,
    #[validate(length(min = 1))]
    pub user_agent: String,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: concat!("dwd-climate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Load settings, layering an optional file and the environment over the
    /// built-in defaults. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.check()?;
        Ok(settings)
    }

    /// Validate field ranges plus the cross-field rules `validator` cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.source.delimiter_byte()?;
        encoding_for_label(&self.source.file_encoding)?;
        Ok(())
    }
}

impl SourceSettings {
    /// The delimiter as the byte the csv crate expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            return Err(ProcessingError::InvalidInput(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() -> Result<()> {
        let settings = Settings::default();
        settings.check()?;
        assert_eq!(settings.source.delimiter_byte()?, b';');
        assert_eq!(settings.interpolation.neighbours, 5);
        Ok(())
    }

    #[test]
    fn test_default_encoding_resolves_to_windows_1252() -> Result<()> {
        let encoding = encoding_for_label(&Settings::default().source.file_encoding)?;
        assert_eq!(encoding, encoding_rs::WINDOWS_1252);
        Ok(())
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let mut settings = Settings::default();
        settings.source.delimiter = 'é';
        assert!(matches!(
            settings.check(),
            Err(ProcessingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_file_overrides_defaults() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[database]")?;
        writeln!(file, "path = \"/tmp/other.db\"")?;
        writeln!(file, "[interpolation]")?;
        writeln!(file, "neighbours = 3")?;

        let settings = Settings::load(Some(file.path()))?;
        assert_eq!(settings.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(settings.interpolation.neighbours, 3);
        assert_eq!(settings.source.header_keyword, "STATIONS_ID");
        Ok(())
    }

    #[test]
    fn test_rejects_zero_neighbours() {
        let mut settings = Settings::default();
        settings.interpolation.neighbours = 0;
        assert!(settings.check().is_err());
    }

    #[test]
    fn test_rejects_unknown_encoding() {
        let mut settings = Settings::default();
        settings.source.file_encoding = "klingon".to_string();
        assert!(matches!(
            settings.check(),
            Err(ProcessingError::UnknownEncoding(_))
        ));
    }
}
