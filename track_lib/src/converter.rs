use std::str::FromStr;

use geojson::{FeatureCollection, GeoJson, Value};
use thiserror::Error;

use crate::{
    track::{Track, TrackSegment},
    track_point::TrackPoint,
};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse GeoJSON document: {0}")]
    Parse(String),
    #[error("failed to read GPX document: {0}")]
    Gpx(String),
}

/// Builds a track with one segment per `LineString` feature, in document order.
///
/// Every other geometry is skipped. A line string with fewer than two positions still
/// becomes a segment; it just has no length.
pub fn track_from_feature_collection(collection: &FeatureCollection, source_name: &str) -> Track {
    let segments = collection
        .features
        .iter()
        .filter_map(|feature| feature.geometry.as_ref())
        .filter_map(|geometry| match &geometry.value {
            Value::LineString(positions) => Some(line_string_segment(positions)),
            _ => None,
        })
        .collect::<Vec<_>>();

    let track = Track::new(strip_extension(source_name).to_string(), segments);
    tracing::info!(
        "Converted {} into track {} with {} segments, {} km",
        source_name,
        track.id(),
        track.segments().len(),
        track.distance_km()
    );
    track
}

pub fn track_from_geojson_str(document: &str, source_name: &str) -> Result<Track, ConvertError> {
    let geojson = GeoJson::from_str(document).map_err(|err| ConvertError::Parse(err.to_string()))?;
    let collection = FeatureCollection::try_from(geojson).map_err(|err| ConvertError::Parse(err.to_string()))?;
    Ok(track_from_feature_collection(&collection, source_name))
}

fn line_string_segment(positions: &[Vec<f64>]) -> TrackSegment {
    let points = positions
        .iter()
        .filter_map(|position| match TrackPoint::try_from(position.as_slice()) {
            Ok(point) => Some(point),
            Err(err) => {
                tracing::warn!("Skipping position {:?}: {}", position, err);
                None
            }
        })
        .collect();

    TrackSegment::new(points)
}

/// `"route.gpx"` -> `"route"`. Only the last extension goes, and only from the file name.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() && !file_name[dot + 1..].contains('/') => &file_name[..dot],
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coordinates: &str) -> String {
        format!(r#"{{ "type": "Feature", "properties": {{}}, "geometry": {{ "type": "LineString", "coordinates": {coordinates} }} }}"#)
    }

    fn collection(features: &[String]) -> String {
        format!(r#"{{ "type": "FeatureCollection", "features": [{}] }}"#, features.join(","))
    }

    #[test]
    fn end_to_end_single_line() {
        let doc = collection(&[line("[[0,0,0],[0,1,100],[0,2,50]]")]);
        let track = track_from_geojson_str(&doc, "hike.gpx").unwrap();

        assert_eq!(track.name, "hike");
        assert_eq!(track.segments().len(), 1);
        assert_eq!(track.segments()[0].points.len(), 3);
        assert!((track.distance_km() - 222.4).abs() < 0.1, "{}", track.distance_km());
        assert_eq!(track.elevation_gain_m(), Some(100.));
        assert!(track.visible());
    }

    #[test]
    fn segments_keep_document_order() {
        let c = line("[[5,5],[5,6]]");
        let a = line("[[1,1],[1,2]]");
        let b = line("[[3,3],[3,4]]");
        let track = track_from_geojson_str(&collection(&[c, a, b]), "legs").unwrap();

        let firsts = track.segments().iter().map(|s| s.points[0].longitude).collect::<Vec<_>>();
        assert_eq!(firsts, vec![5., 1., 3.]);
    }

    #[test]
    fn other_geometries_are_skipped() {
        let point = r#"{ "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1, 2] } }"#.to_string();
        let polygon = r#"{ "type": "Feature", "properties": {}, "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } }"#.to_string();
        let empty = r#"{ "type": "Feature", "properties": {}, "geometry": null }"#.to_string();
        let track = track_from_geojson_str(&collection(&[point, line("[[0,0],[1,1]]"), polygon, empty]), "mixed").unwrap();

        assert_eq!(track.segments().len(), 1);
    }

    #[test]
    fn missing_elevation_stays_missing() {
        let track = track_from_geojson_str(&collection(&[line("[[10,56],[11,56,0]]")]), "x").unwrap();
        let points = &track.segments()[0].points;
        assert_eq!(points[0].elevation, None);
        assert_eq!(points[1].elevation, Some(0.));
        assert_eq!(track.elevation_gain_m(), None);
    }

    #[test]
    fn single_position_line_is_a_zero_length_segment() {
        let track = track_from_geojson_str(&collection(&[line("[[10,56,3]]")]), "dot").unwrap();
        assert_eq!(track.segments().len(), 1);
        assert_eq!(track.segments()[0].points.len(), 1);
        assert_eq!(track.distance_km(), 0.);
    }

    #[test]
    fn empty_collection_gives_empty_track() {
        let track = track_from_geojson_str(&collection(&[]), "nothing.geojson").unwrap();
        assert!(track.segments().is_empty());
        assert_eq!(track.elevation_gain_m(), None);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(track_from_geojson_str("not json", "x"), Err(ConvertError::Parse(_))));
        let point = r#"{ "type": "Point", "coordinates": [1, 2] }"#;
        assert!(matches!(track_from_geojson_str(point, "x"), Err(ConvertError::Parse(_))));
    }

    #[test]
    fn extension_stripping() {
        assert_eq!(strip_extension("route.gpx"), "route");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("no_extension"), "no_extension");
        assert_eq!(strip_extension("trailing."), "trailing.");
        assert_eq!(strip_extension("dir.v2/file"), "dir.v2/file");
    }
}
