//! One ingestion run: station list, archive discovery, per-archive
//! extract/normalize/load.

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::archive::{ArchiveExtractor, Normalizer, WorkFiles};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::settings::Settings;
use crate::store::{LoadReport, ParameterImporter, StationImporter, Store, TableLoader};
use crate::utils::{encoding_for_label, ProgressReporter};

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub stations_inserted: usize,
    pub archives_processed: usize,
    pub archives_skipped: usize,
    pub rows_inserted: usize,
    pub rows_skipped: usize,
    pub parameters_inserted: usize,
}

impl RunSummary {
    /// Count the outcome of one archive. Fatal errors are handed back to the
    /// caller; anything else is logged and the archive counted as skipped.
    fn record(&mut self, archive: &str, outcome: Result<ArchiveReport>) -> Result<()> {
        match outcome {
            Ok(report) => {
                self.archives_processed += 1;
                self.rows_inserted += report.load.inserted;
                self.rows_skipped += report.load.skipped;
                self.parameters_inserted += report.parameters_inserted;
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(%archive, error = %e, "Skipping archive");
                self.archives_skipped += 1;
                Ok(())
            }
        }
    }
}

/// Outcome of one archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveReport {
    pub load: LoadReport,
    pub parameters_inserted: usize,
}

pub struct IngestionPipeline {
    settings: Settings,
    store: Store,
    normalizer: Normalizer,
    encoding: &'static Encoding,
    silent: bool,
}

impl IngestionPipeline {
    pub fn new(settings: Settings, store: Store) -> Result<Self> {
        let normalizer = Normalizer::from_settings(&settings.source)?;
        let encoding = encoding_for_label(&settings.source.file_encoding)?;
        Ok(Self {
            settings,
            store,
            normalizer,
            encoding,
            silent: false,
        })
    }

    /// Suppress the progress bar.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Download and load everything the remote listing offers, up to `limit`
    /// archives. Per-file failures are logged and skipped.
    pub fn run(&mut self, limit: Option<usize>) -> Result<RunSummary> {
        let fetcher = Fetcher::new(&self.settings)?;
        let mut summary = RunSummary::default();

        match self.import_station_list(&fetcher) {
            Ok(inserted) => summary.stations_inserted = inserted,
            Err(e) => warn!(error = %e, "Station list import failed, continuing"),
        }

        let mut uris = match fetcher.list(&self.settings.source.archive_pattern) {
            Ok(uris) => uris,
            Err(e) => {
                error!(error = %e, "Could not list remote archives");
                return Ok(summary);
            }
        };
        if let Some(limit) = limit {
            uris.truncate(limit);
        }

        let progress = ProgressReporter::new(uris.len() as u64, "Ingesting archives", self.silent);
        for uri in &uris {
            let outcome = fetcher
                .fetch(uri)
                .and_then(|archive| self.process(&archive, true));
            summary.record(uri, outcome)?;
            progress.increment(1);
        }
        progress.finish_with_message("Ingestion complete");

        log_summary(&summary);
        Ok(summary)
    }

    /// Load archives that are already on disk, in order. A failing archive is
    /// logged and skipped; only fatal errors stop the batch. The archives
    /// themselves are kept.
    pub fn process_archives(&mut self, archives: &[PathBuf]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let progress =
            ProgressReporter::new(archives.len() as u64, "Loading archives", self.silent);
        for archive in archives {
            let outcome = self.process(archive, false);
            summary.record(&archive.display().to_string(), outcome)?;
            progress.increment(1);
        }
        progress.finish_with_message("Archives loaded");

        log_summary(&summary);
        Ok(summary)
    }

    /// Load an archive that is already on disk. The archive itself is kept.
    pub fn process_archive(&mut self, archive: &Path) -> Result<ArchiveReport> {
        self.process(archive, false)
    }

    /// Import a station list that is already on disk.
    pub fn import_stations(&self, path: &Path) -> Result<usize> {
        StationImporter::new(&self.store, self.encoding).import(path)
    }

    fn import_station_list(&self, fetcher: &Fetcher) -> Result<usize> {
        let path = fetcher.fetch_station_list()?;
        let result = self.import_stations(&path);
        // Fetched fresh on every run so new stations are picked up.
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "Failed to remove station list");
        }
        result
    }

    fn process(&mut self, archive: &Path, owns_archive: bool) -> Result<ArchiveReport> {
        let work = WorkFiles::new(
            &self.settings.paths.extract_dir,
            owns_archive.then(|| archive.to_path_buf()),
        )?;
        let extractor = ArchiveExtractor::new(work.scratch_dir());

        let product = extractor.extract(archive, &self.settings.source.product_member_pattern)?;
        let normalized = self.normalizer.normalize(&product)?;
        let load = TableLoader::new(&mut self.store).load(&normalized)?;

        let parameters_inserted =
            match extractor.extract(archive, &self.settings.source.parameter_member_pattern) {
                Ok(metadata) => ParameterImporter::new(&self.store, self.encoding)
                    .import(&metadata)
                    .unwrap_or_else(|e| {
                        warn!(archive = %archive.display(), error = %e, "Parameter import failed");
                        0
                    }),
                Err(e) => {
                    warn!(archive = %archive.display(), error = %e, "No parameter metadata");
                    0
                }
            };

        Ok(ArchiveReport {
            load,
            parameters_inserted,
        })
    }
}

fn log_summary(summary: &RunSummary) {
    info!(
        processed = summary.archives_processed,
        skipped = summary.archives_skipped,
        rows_inserted = summary.rows_inserted,
        rows_skipped = summary.rows_skipped,
        "Run finished"
    );
}
