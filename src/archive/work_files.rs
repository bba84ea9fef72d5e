use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Transient files belonging to one archive of one run.
///
/// Holds a scratch directory for extracted and normalized members and,
/// optionally, the downloaded archive itself. Both are removed when the guard
/// is dropped, whichever way processing of the archive ends.
pub struct WorkFiles {
    scratch: TempDir,
    _archive: OwnedArchive,
}

impl WorkFiles {
    /// Create a scratch directory under `extract_dir`. `owned_archive` is
    /// deleted on drop, or right away if the scratch directory cannot be
    /// created; pass `None` for archives the caller wants to keep.
    pub fn new(extract_dir: &Path, owned_archive: Option<PathBuf>) -> Result<Self> {
        let archive = OwnedArchive(owned_archive);

        std::fs::create_dir_all(extract_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("archive-")
            .tempdir_in(extract_dir)?;

        Ok(Self {
            scratch,
            _archive: archive,
        })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// A downloaded archive, deleted on drop.
struct OwnedArchive(Option<PathBuf>);

impl Drop for OwnedArchive {
    fn drop(&mut self) {
        if let Some(archive) = self.0.take() {
            match std::fs::remove_file(&archive) {
                Ok(()) => debug!(path = %archive.display(), "Removed downloaded archive"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %archive.display(), error = %e, "Failed to remove archive"),
            }
        }
    }
}
