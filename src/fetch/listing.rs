use reqwest::Url;

use crate::error::{ProcessingError, Result};

/// Extract links from an HTML directory index.
///
/// Every `href="..."` whose trailing path segment contains `pattern` is
/// resolved against `base_url`. Duplicates are dropped, first occurrence wins.
pub fn parse_listing(body: &str, base_url: &str, pattern: &str) -> Result<Vec<String>> {
    let mut base = Url::parse(base_url).map_err(|e| {
        ProcessingError::InvalidInput(format!("Invalid listing URL '{}': {}", base_url, e))
    })?;
    // The listing is a directory; without the slash `join` drops its last segment.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    const HREF: &str = "href=\"";
    let mut uris: Vec<String> = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find(HREF) {
        rest = &rest[start + HREF.len()..];
        let Some(end) = rest.find('"') else {
            break;
        };
        let target = &rest[..end];
        rest = &rest[end + 1..];

        if !trailing_segment(target).contains(pattern) {
            continue;
        }
        let Ok(uri) = base.join(target) else {
            continue;
        };
        let uri = uri.to_string();
        if !uris.contains(&uri) {
            uris.push(uri);
        }
    }

    Ok(uris)
}

/// Last non-empty path segment of a URI or relative reference.
pub(crate) fn trailing_segment(uri: &str) -> &str {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}
