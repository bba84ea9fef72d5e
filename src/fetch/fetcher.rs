use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tracing::{debug, info};

use super::listing::{parse_listing, trailing_segment};
use crate::error::{ProcessingError, Result};
use crate::settings::Settings;

/// Lists and downloads files from the remote archive directory.
pub struct Fetcher {
    client: Client,
    base_url: String,
    station_list_url: String,
    download_dir: PathBuf,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.geocoder.user_agent.as_str())
            .build()
            .map_err(|source| ProcessingError::NetworkFailure {
                url: settings.source.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: settings.source.base_url.clone(),
            station_list_url: settings.source.station_list_url.clone(),
            download_dir: settings.paths.download_dir.clone(),
        })
    }

    /// URIs of all remote files whose name contains `pattern`.
    pub fn list(&self, pattern: &str) -> Result<Vec<String>> {
        info!(url = %self.base_url, pattern, "Listing remote files");
        let body = self
            .client
            .get(&self.base_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|source| ProcessingError::NetworkFailure {
                url: self.base_url.clone(),
                source,
            })?;

        let uris = parse_listing(&body, &self.base_url, pattern)?;
        info!(count = uris.len(), "Found remote files");
        Ok(uris)
    }

    /// Download `uri` into the download directory unless a file of that name
    /// is already there. Returns the local path.
    pub fn fetch(&self, uri: &str) -> Result<PathBuf> {
        let file_name = trailing_segment(uri);
        if file_name.is_empty() {
            return Err(ProcessingError::InvalidInput(format!(
                "No file name in '{}'",
                uri
            )));
        }
        let local_path = self.download_dir.join(file_name);

        if local_path.exists() {
            debug!(path = %local_path.display(), "Already downloaded");
            return Ok(local_path);
        }

        std::fs::create_dir_all(&self.download_dir)?;
        self.download(uri, &local_path)?;
        info!(%uri, path = %local_path.display(), "Downloaded");
        Ok(local_path)
    }

    /// Download the station master list.
    pub fn fetch_station_list(&self) -> Result<PathBuf> {
        self.fetch(&self.station_list_url)
    }

    /// Stream into a temporary file next to the target and move it into place
    /// only once the body is complete.
    fn download(&self, uri: &str, local_path: &Path) -> Result<()> {
        let network = |source: reqwest::Error| ProcessingError::NetworkFailure {
            url: uri.to_string(),
            source,
        };

        let mut response = self
            .client
            .get(uri)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(network)?;

        let mut partial = tempfile::NamedTempFile::new_in(&self.download_dir)?;
        response.copy_to(&mut partial).map_err(network)?;
        partial
            .persist(local_path)
            .map_err(|e| ProcessingError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_settings(download_dir: &Path) -> Settings {
        let mut settings = Settings::default();
        // Nothing listens on the discard port, so any request fails fast.
        settings.source.base_url = "http://127.0.0.1:9/kl/".to_string();
        settings.source.station_list_url = "http://127.0.0.1:9/kl/stations.txt".to_string();
        settings.paths.download_dir = download_dir.to_path_buf();
        settings
    }

    #[test]
    fn test_existing_file_is_not_downloaded() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let existing = dir.path().join("tageswerte_KL_00044_hist.zip");
        std::fs::write(&existing, b"zip")?;

        let fetcher = Fetcher::new(&offline_settings(dir.path()))?;
        let path = fetcher.fetch("http://127.0.0.1:9/kl/tageswerte_KL_00044_hist.zip")?;

        assert_eq!(path, existing);
        assert_eq!(std::fs::read(&path)?, b"zip");
        Ok(())
    }

    #[test]
    fn test_failed_download_leaves_nothing_behind() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let fetcher = Fetcher::new(&offline_settings(dir.path()))?;

        let err = fetcher.fetch_station_list().unwrap_err();
        assert!(matches!(err, ProcessingError::NetworkFailure { .. }));
        assert!(!err.is_fatal());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}
