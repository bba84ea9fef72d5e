use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cannot open store '{}': {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Network request failed for {url}: {source}")]
    NetworkFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Corrupt archive '{}': {source}", path.display())]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("No member matching '{pattern}' in archive '{}'", archive.display())]
    MemberNotFound { archive: PathBuf, pattern: String },

    #[error("No header line containing '{keyword}' in '{}'", path.display())]
    HeaderNotFound { path: PathBuf, keyword: String },

    #[error("Cannot determine target table for '{}' (header: {})", path.display(), header.join(", "))]
    UnroutableFile { path: PathBuf, header: Vec<String> },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Bulk transfer of {rows} rows rejected: {source}")]
    BulkTransferFailure {
        rows: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Could not geocode '{0}'")]
    GeocodeFailure(String),

    #[error("No station near the requested location reported data for {0}")]
    NoContributingStation(NaiveDate),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema file '{}' could not be read: {source}", path.display())]
    SchemaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    /// Errors that must stop an ingestion run. Everything else is contained at
    /// file or row level.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProcessingError::StoreOpen { .. }
                | ProcessingError::SchemaFile { .. }
                | ProcessingError::Config(_)
                | ProcessingError::Validation(_)
        )
    }

    /// Map a failed single-row insert into the taxonomy used by the row loader.
    pub fn from_insert(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ProcessingError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| code.to_string()),
                )
            }
            other => ProcessingError::Database(other),
        }
    }
}
