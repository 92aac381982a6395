use serde::Serialize;

pub const EARTH_RADIUS_KM: f64 = 6371.0; // Mean radius of the earth in km

/// A `[longitude, latitude]` pair, in the order GeoJSON and map renderers use.
pub type LngLat = [f64; 2];

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

/// Great-circle distance in km between two points, using the haversine formula.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = deg_to_rad(lat2 - lat1);
    let d_lon = deg_to_rad(lon2 - lon1);

    let a = f64::sin(d_lat / 2.) * f64::sin(d_lat / 2.)
        + f64::cos(deg_to_rad(lat1)) * f64::cos(deg_to_rad(lat2)) * f64::sin(d_lon / 2.) * f64::sin(d_lon / 2.);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Bounding box that grows one point at a time.
///
/// Longitudes are unwrapped as they are added: a point may be placed 360° east or west of
/// its nominal value when that keeps the box narrower. A route crossing the anti-meridian
/// from 179° to -179° therefore spans 179..181 rather than the whole globe. `east` may
/// exceed 180 as a result, which map renderers accept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    pub fn from_point(point: LngLat) -> Self {
        let [lng, lat] = point;
        Self {
            west: lng,
            south: lat,
            east: lng,
            north: lat,
        }
    }

    /// Bounds of all points, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LngLat>,
    {
        let mut points = points.into_iter();
        let mut bounds = Self::from_point(points.next()?);
        for point in points {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: LngLat) {
        let [lng, lat] = point;

        let mut best = (self.west.min(lng), self.east.max(lng));
        for candidate in [lng - 360., lng + 360.] {
            let west = self.west.min(candidate);
            let east = self.east.max(candidate);
            if east - west < best.1 - best.0 {
                best = (west, east);
            }
        }

        self.west = best.0;
        self.east = best.1;
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);

        // Keep west inside the canonical range so equal boxes compare equal
        if self.west < -180. {
            self.west += 360.;
            self.east += 360.;
        } else if self.west >= 180. {
            self.west -= 360.;
            self.east -= 360.;
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.east > 180.
    }

    pub fn center(&self) -> LngLat {
        let mut lng = (self.west + self.east) / 2.;
        if lng > 180. {
            lng -= 360.;
        }
        [lng, (self.south + self.north) / 2.]
    }
}
