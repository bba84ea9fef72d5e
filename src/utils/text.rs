use std::path::Path;

use encoding_rs::Encoding;
use tracing::warn;

use crate::error::{ProcessingError, Result};

/// Resolve an encoding label such as `latin1` or `utf-8`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ProcessingError::UnknownEncoding(label.to_string()))
}

/// Read a whole file and decode it. Malformed sequences are replaced rather
/// than rejected.
pub fn read_decoded(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            path = %path.display(),
            encoding = used.name(),
            "Replaced malformed byte sequences while decoding"
        );
    }
    Ok(text.into_owned())
}
