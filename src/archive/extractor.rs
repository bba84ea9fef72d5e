use crate::error::{ProcessingError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Pulls single members out of downloaded archives.
pub struct ArchiveExtractor {
    dest_dir: PathBuf,
}

impl ArchiveExtractor {
    pub fn new(dest_dir: &Path) -> Self {
        Self {
            dest_dir: dest_dir.to_path_buf(),
        }
    }

    /// Extract the first member, in archive order, whose name contains
    /// `member_pattern`. The member is written under its own file name
    /// directly into the destination directory.
    pub fn extract(&self, archive_path: &Path, member_pattern: &str) -> Result<PathBuf> {
        let corrupt = |source: ZipError| ProcessingError::CorruptArchive {
            path: archive_path.to_path_buf(),
            source,
        };

        let file = File::open(archive_path)?;
        let mut archive = ZipArchive::new(file).map_err(corrupt)?;

        let mut selected: Option<(usize, String)> = None;
        let mut matches = 0;
        for i in 0..archive.len() {
            let zip_file = archive.by_index(i).map_err(corrupt)?;
            if zip_file.is_dir() || !zip_file.name().contains(member_pattern) {
                continue;
            }

            let Some(file_name) = zip_file
                .enclosed_name()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
            else {
                warn!(
                    archive = %archive_path.display(),
                    member = zip_file.name(),
                    "Rejecting member with an unsafe path"
                );
                continue;
            };

            matches += 1;
            if selected.is_none() {
                selected = Some((i, file_name));
            }
        }

        let Some((index, file_name)) = selected else {
            return Err(ProcessingError::MemberNotFound {
                archive: archive_path.to_path_buf(),
                pattern: member_pattern.to_string(),
            });
        };
        if matches > 1 {
            debug!(
                archive = %archive_path.display(),
                pattern = member_pattern,
                matches,
                chosen = %file_name,
                "Several members match, using the first"
            );
        }

        std::fs::create_dir_all(&self.dest_dir)?;
        let dest_path = self.dest_dir.join(&file_name);

        let mut zip_file = archive.by_index(index).map_err(corrupt)?;
        let mut writer = BufWriter::new(File::create(&dest_path)?);
        std::io::copy(&mut zip_file, &mut writer).map_err(|e| corrupt(ZipError::Io(e)))?;
        writer.flush()?;

        Ok(dest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::{CompressionMethod, ZipWriter};

    fn create_test_zip(members: &[(&str, &[u8])]) -> Result<NamedTempFile> {
        let file = NamedTempFile::new()?;
        {
            let mut zip = ZipWriter::new(&file);
            for (name, content) in members {
                let options =
                    zip::write::FileOptions::default().compression_method(CompressionMethod::Stored);
                zip.start_file(*name, options).map_err(std::io::Error::from)?;
                zip.write_all(content)?;
            }
            zip.finish().map_err(std::io::Error::from)?;
        }
        Ok(file)
    }

    #[test]
    fn test_extract_keeps_member_name() -> Result<()> {
        let zip = create_test_zip(&[
            ("Metadaten_Geographie_00044.txt", b"geo"),
            ("produkt_klima_tag_19690101_20231231_00044.txt", b"STATIONS_ID;MESS_DATUM"),
        ])?;
        let dest = tempfile::tempdir()?;

        let path = ArchiveExtractor::new(dest.path()).extract(zip.path(), "produkt_")?;

        assert_eq!(
            path,
            dest.path().join("produkt_klima_tag_19690101_20231231_00044.txt")
        );
        assert_eq!(std::fs::read_to_string(&path)?, "STATIONS_ID;MESS_DATUM");
        Ok(())
    }

    #[test]
    fn test_first_match_wins() -> Result<()> {
        let zip = create_test_zip(&[("produkt_a.txt", b"first"), ("produkt_b.txt", b"second")])?;
        let dest = tempfile::tempdir()?;

        let path = ArchiveExtractor::new(dest.path()).extract(zip.path(), "produkt_")?;
        assert_eq!(std::fs::read_to_string(path)?, "first");
        assert!(!dest.path().join("produkt_b.txt").exists());
        Ok(())
    }

    #[test]
    fn test_nested_member_is_flattened() -> Result<()> {
        let zip = create_test_zip(&[("sub/dir/produkt_x.txt", b"x")])?;
        let dest = tempfile::tempdir()?;

        let path = ArchiveExtractor::new(dest.path()).extract(zip.path(), "produkt_")?;
        assert_eq!(path, dest.path().join("produkt_x.txt"));
        Ok(())
    }

    #[test]
    fn test_escaping_member_is_rejected() -> Result<()> {
        let zip = create_test_zip(&[("../produkt_evil.txt", b"x")])?;
        let dest = tempfile::tempdir()?;

        let err = ArchiveExtractor::new(dest.path())
            .extract(zip.path(), "produkt_")
            .unwrap_err();
        assert!(matches!(err, ProcessingError::MemberNotFound { .. }));
        Ok(())
    }

    #[test]
    fn test_missing_member() -> Result<()> {
        let zip = create_test_zip(&[("readme.txt", b"x")])?;
        let dest = tempfile::tempdir()?;

        let err = ArchiveExtractor::new(dest.path())
            .extract(zip.path(), "produkt_")
            .unwrap_err();
        assert!(matches!(err, ProcessingError::MemberNotFound { .. }));
        Ok(())
    }

    #[test]
    fn test_corrupt_archive() -> Result<()> {
        let mut not_a_zip = NamedTempFile::new()?;
        not_a_zip.write_all(b"this is not a zip file")?;
        let dest = tempfile::tempdir()?;

        let err = ArchiveExtractor::new(dest.path())
            .extract(not_a_zip.path(), "produkt_")
            .unwrap_err();
        assert!(matches!(err, ProcessingError::CorruptArchive { .. }));
        assert!(!err.is_fatal());
        Ok(())
    }
}
