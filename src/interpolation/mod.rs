//! Spatial interpolation of station measurements to arbitrary points.

mod engine;
mod geocode;
mod locator;
mod series;

pub use engine::{inverse_distance_weighting, Estimate, Interpolator};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use locator::{nearest, NearbyStation};
pub use series::{SeriesRow, SeriesTable};
