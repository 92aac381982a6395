use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{metrics, track_point::TrackPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One unbroken leg of travel. Point order is travel order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
}

impl TrackSegment {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }
}

/// A named, colored set of segments with metrics derived from them.
///
/// Distance and elevation gain are private and recomputed on every change to the segments.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    id: TrackId,
    pub name: String,
    pub description: String,
    segments: Vec<TrackSegment>,
    color: String,
    distance_km: f64,
    elevation_gain_m: Option<f64>,
    visible: bool,
    created_at: DateTime<Utc>,
}

impl Track {
    pub fn new(name: String, segments: Vec<TrackSegment>) -> Self {
        Self::with_color(name, segments, random_color())
    }

    pub fn with_color(name: String, segments: Vec<TrackSegment>, color: String) -> Self {
        let mut track = Self {
            id: TrackId::new(),
            name,
            description: String::new(),
            segments: Vec::new(),
            color,
            distance_km: 0.,
            elevation_gain_m: None,
            visible: true,
            created_at: Utc::now(),
        };
        track.set_segments(segments);
        track
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn set_segments(&mut self, segments: Vec<TrackSegment>) {
        self.segments = segments;
        self.distance_km = metrics::total_distance(&self.segments);
        self.elevation_gain_m = metrics::elevation_gain(&self.segments);
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: String) {
        self.color = color;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn elevation_gain_m(&self) -> Option<f64> {
        self.elevation_gain_m
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.segments.iter().flat_map(|segment| segment.points.iter())
    }
}

/// A random `#rrggbb` color.
pub fn random_color() -> String {
    format!("#{:06x}", rand::random::<u32>() & 0xFF_FFFF)
}
