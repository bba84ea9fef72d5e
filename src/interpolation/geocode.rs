use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};
use crate::settings::GeocoderSettings;
use crate::utils::Coordinate;

/// Resolves free-text addresses to coordinates.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Result<Coordinate>;
}

/// Geocoder backed by a Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(settings: &GeocoderSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|source| ProcessingError::NetworkFailure {
                url: settings.endpoint.clone(),
                source,
            })?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Result<Coordinate> {
        let failure = || ProcessingError::GeocodeFailure(address.to_string());

        let places: Vec<Place> = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| {
                warn!(address, error = %e, "Geocoding request failed");
                failure()
            })?;

        let place = places.into_iter().next().ok_or_else(failure)?;
        let latitude = place.lat.parse::<f64>().map_err(|_| failure())?;
        let longitude = place.lon.parse::<f64>().map_err(|_| failure())?;
        debug!(address, latitude, longitude, "Geocoded");

        Coordinate::new(latitude, longitude).map_err(|_| failure())
    }
}
