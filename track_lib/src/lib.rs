pub mod geometry;
pub mod track_point;
pub mod track;
pub mod metrics;
pub mod converter;
pub mod gpx_util;
pub mod trip;
pub mod webhook;

pub use converter::ConvertError;
pub use track::{Track, TrackId, TrackSegment};
pub use track_point::TrackPoint;
pub use trip::{TripData, Waypoint};
pub use webhook::IngestError;
