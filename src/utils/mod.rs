pub mod constants;
pub mod coordinates;
pub mod progress;
pub mod text;

pub use constants::*;
pub use coordinates::{haversine_distance, Coordinate};
pub use progress::ProgressReporter;
pub use text::{encoding_for_label, read_decoded};
