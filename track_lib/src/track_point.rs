use serde::{Deserialize, Serialize};

use crate::geometry::LngLat;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters. `None` when the source carried no elevation, which is not the same as sea level.
    pub elevation: Option<f64>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, elevation: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            elevation,
        }
    }

    pub fn lng_lat(&self) -> LngLat {
        [self.longitude, self.latitude]
    }

    /// GeoJSON position for renderer sources. Missing elevation is written as 0.
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.longitude, self.latitude, self.elevation.unwrap_or(0.)]
    }
}

impl TryFrom<&[f64]> for TrackPoint {
    type Error = &'static str;

    /// Reads a GeoJSON `[longitude, latitude, elevation?]` position.
    fn try_from(position: &[f64]) -> Result<Self, Self::Error> {
        match position {
            [longitude, latitude] => Ok(Self::new(*latitude, *longitude, None)),
            [longitude, latitude, elevation, ..] => Ok(Self::new(*latitude, *longitude, Some(*elevation))),
            _ => Err("Position needs at least a longitude and a latitude"),
        }
    }
}
