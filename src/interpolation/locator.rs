use serde::Serialize;

use crate::models::Station;
use crate::utils::Coordinate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStation {
    pub station: Station,
    pub distance_km: f64,
}

/// The `k` stations closest to `target` by great-circle distance.
///
/// Stations without coordinates are ignored. Ties keep their input order.
pub fn nearest(stations: &[Station], target: &Coordinate, k: usize) -> Vec<NearbyStation> {
    let mut with_distance: Vec<NearbyStation> = stations
        .iter()
        .filter_map(|station| {
            let position = station.coordinate()?;
            Some(NearbyStation {
                station: station.clone(),
                distance_km: target.distance_to(&position),
            })
        })
        .collect();

    with_distance.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    with_distance.truncate(k);
    with_distance
}
