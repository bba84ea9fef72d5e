pub mod normalized_reader;
pub mod parameter_reader;
pub mod station_reader;

pub use normalized_reader::{NormalizedTable, RowBatch};
pub use parameter_reader::ParameterReader;
pub use station_reader::StationReader;
