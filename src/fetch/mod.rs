//! Discovery and download of remote source files.

mod fetcher;
mod listing;

pub use fetcher::Fetcher;
pub use listing::parse_listing;
