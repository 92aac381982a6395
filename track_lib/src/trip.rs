use serde::{Deserialize, Serialize};

use crate::geometry::LngLat;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub coordinates: LngLat,
    /// Free-form category such as `campsite`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, coordinates: LngLat) -> Self {
        Self {
            name: name.into(),
            coordinates,
            ..Default::default()
        }
    }
}

/// A planned trip as delivered by the trip webhook. Replaced as a whole, never merged.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripData {
    /// Sender's own id for the trip, kept as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_location: String,
    pub end_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_coordinates: Option<LngLat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_coordinates: Option<LngLat>,
    pub waypoints: Vec<Waypoint>,
}

impl TripData {
    /// Every known coordinate: start, waypoints in order, then end.
    pub fn coordinates(&self) -> Vec<LngLat> {
        self.start_coordinates
            .into_iter()
            .chain(self.waypoints.iter().map(|waypoint| waypoint.coordinates))
            .chain(self.end_coordinates)
            .collect()
    }
}
