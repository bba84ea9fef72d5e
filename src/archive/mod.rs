pub mod extractor;
pub mod normalizer;
pub mod work_files;

pub use extractor::ArchiveExtractor;
pub use normalizer::Normalizer;
pub use work_files::WorkFiles;
