pub mod archive;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod interpolation;
pub mod models;
pub mod pipeline;
pub mod readers;
pub mod settings;
pub mod store;
pub mod utils;

pub use error::{ProcessingError, Result};
pub use pipeline::{ArchiveReport, IngestionPipeline, RunSummary};
pub use settings::Settings;
