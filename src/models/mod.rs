pub mod measurement;
pub mod parameter;
pub mod station;

pub use measurement::Measurement;
pub use parameter::Parameter;
pub use station::Station;
