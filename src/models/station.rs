use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::Coordinate;

/// One entry of the station master list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: i64,

    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,

    /// Meters above sea level
    pub elevation: Option<f64>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub name: String,
    pub region: String,
}

impl Station {
    /// Location of the station, if both latitude and longitude are known
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}
