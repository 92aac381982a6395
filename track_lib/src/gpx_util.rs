use std::io::Read;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::{
    converter::{track_from_feature_collection, ConvertError},
    track::Track,
};

/// Reads a GPX document into a line-geometry collection.
///
/// Every track segment becomes a `LineString` feature of `[lon, lat, ele?]` positions and
/// every waypoint a `Point` feature, in document order.
pub fn read_gpx<R: Read>(reader: R) -> Result<FeatureCollection, ConvertError> {
    let gpx = gpx::read(reader).map_err(|err| ConvertError::Gpx(err.to_string()))?;

    let mut features = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            let positions = segment
                .points
                .iter()
                .map(|waypoint| {
                    let point = waypoint.point();
                    match waypoint.elevation {
                        Some(elevation) => vec![point.x(), point.y(), elevation],
                        None => vec![point.x(), point.y()],
                    }
                })
                .collect();
            features.push(feature(Value::LineString(positions), track.name.as_deref()));
        }
    }

    for waypoint in &gpx.waypoints {
        let point = waypoint.point();
        features.push(feature(Value::Point(vec![point.x(), point.y()]), waypoint.name.as_deref()));
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// GPX file straight to a track. See [`track_from_feature_collection`].
pub fn track_from_gpx<R: Read>(reader: R, source_name: &str) -> Result<Track, ConvertError> {
    let collection = read_gpx(reader)?;
    Ok(track_from_feature_collection(&collection, source_name))
}

fn feature(value: Value, name: Option<&str>) -> Feature {
    let mut properties = JsonObject::new();
    if let Some(name) = name {
        properties.insert("name".to_string(), name.into());
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}
