use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::geocode::Geocoder;
use super::locator::{nearest, NearbyStation};
use super::series::{SeriesRow, SeriesTable};
use crate::error::{ProcessingError, Result};
use crate::models::Measurement;
use crate::store::Store;
use crate::utils::Coordinate;

/// Interpolated value per parameter code. `None` marks a parameter no nearby
/// station reported.
pub type Estimate = BTreeMap<String, Option<f64>>;

/// Inverse-distance-weighted estimates from the stations nearest a point.
pub struct Interpolator<'a> {
    store: &'a Store,
    neighbours: usize,
}

impl<'a> Interpolator<'a> {
    pub fn new(store: &'a Store, neighbours: usize) -> Self {
        Self { store, neighbours }
    }

    /// The `k` stations closest to `target`.
    pub fn nearest(&self, target: &Coordinate, k: usize) -> Result<Vec<NearbyStation>> {
        let stations = self.store.stations()?;
        Ok(nearest(&stations, target, k))
    }

    /// Estimate every known parameter at `target` on `date`.
    ///
    /// Returns `None` when none of the nearest stations reported anything for
    /// that day.
    pub fn interpolate(&self, target: &Coordinate, date: NaiveDate) -> Result<Option<Estimate>> {
        let neighbours = self.nearest(target, self.neighbours)?;
        let codes = self.parameter_codes()?;
        self.estimate_for_day(&neighbours, &codes, date)
    }

    /// Daily estimates for `start..=end`. Days without data are omitted.
    pub fn series(&self, target: &Coordinate, start: NaiveDate, end: NaiveDate) -> Result<SeriesTable> {
        if start > end {
            return Err(ProcessingError::InvalidInput(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }

        let neighbours = self.nearest(target, self.neighbours)?;
        let codes = self.parameter_codes()?;
        let mut table = SeriesTable::new(&codes);

        for date in start.iter_days().take_while(|d| *d <= end) {
            match self.estimate_for_day(&neighbours, &codes, date)? {
                Some(estimate) => table.rows.push(SeriesRow {
                    date,
                    values: codes.iter().map(|c| estimate.get(c).copied().flatten()).collect(),
                }),
                None => debug!(%date, "No data, omitting day"),
            }
        }

        info!(
            latitude = target.latitude,
            longitude = target.longitude,
            %start,
            %end,
            rows = table.len(),
            "Built series"
        );
        Ok(table)
    }

    pub fn interpolate_address(
        &self,
        geocoder: &dyn Geocoder,
        address: &str,
        date: NaiveDate,
    ) -> Result<Option<Estimate>> {
        let target = geocoder.geocode(address)?;
        self.interpolate(&target, date)
    }

    pub fn series_for_address(
        &self,
        geocoder: &dyn Geocoder,
        address: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SeriesTable> {
        let target = geocoder.geocode(address)?;
        self.series(&target, start, end)
    }

    fn parameter_codes(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .parameters()?
            .into_iter()
            .map(|p| p.code)
            .collect())
    }

    fn estimate_for_day(
        &self,
        neighbours: &[NearbyStation],
        codes: &[String],
        date: NaiveDate,
    ) -> Result<Option<Estimate>> {
        let mut samples = Vec::with_capacity(neighbours.len());
        for neighbour in neighbours {
            if let Some(measurement) = self.store.measurement(neighbour.station.station_id, date)? {
                samples.push((neighbour.distance_km, measurement));
            }
        }
        Ok(inverse_distance_weighting(&samples, codes))
    }
}

/// Combine `(distance_km, measurement)` samples into one estimate per code.
///
/// Per code, only stations that reported a value take part. A station at
/// distance zero is returned as-is; otherwise the estimate is
/// `Σ(v/d) / Σ(1/d)`. Returns `None` if no sample reported any code.
pub fn inverse_distance_weighting(
    samples: &[(f64, Measurement)],
    codes: &[String],
) -> Option<Estimate> {
    let mut estimate = Estimate::new();
    let mut any_reported = false;

    for code in codes {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut exact = None;

        for (distance, measurement) in samples {
            let Some(value) = measurement.value(code) else {
                continue;
            };
            if *distance == 0.0 {
                exact = Some(value);
                break;
            }
            weighted_sum += value / distance;
            weight_total += 1.0 / distance;
        }

        let value = exact.or_else(|| (weight_total > 0.0).then(|| weighted_sum / weight_total));
        any_reported |= value.is_some();
        estimate.insert(code.clone(), value);
    }

    any_reported.then_some(estimate)
}
