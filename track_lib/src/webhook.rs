use serde_json::Value;
use thiserror::Error;

use crate::{
    geometry::LngLat,
    trip::{TripData, Waypoint},
};

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("malformed payload: field `{field}` {reason}")]
    MalformedPayload { field: String, reason: &'static str },
}

impl IngestError {
    fn malformed(field: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedPayload {
            field: field.into(),
            reason,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::MalformedPayload { field, .. } => field,
        }
    }
}

/// Parses raw webhook bytes, then validates them with [`ingest`].
pub fn ingest_slice(bytes: &[u8]) -> Result<TripData, IngestError> {
    let payload: Value = serde_json::from_slice(bytes).map_err(|_| IngestError::malformed("$", "is not valid JSON"))?;
    ingest(&payload)
}

/// Validates a trip webhook payload.
///
/// Fields are checked in a fixed order and the first bad one is reported, so a payload is
/// either taken as a whole or not at all.
pub fn ingest(payload: &Value) -> Result<TripData, IngestError> {
    let Some(object) = payload.as_object() else {
        return Err(IngestError::malformed("$", "must be an object"));
    };

    let title = string_field(object, "title")?;
    let start_location = string_field(object, "startLocation")?;
    let end_location = string_field(object, "endLocation")?;

    let waypoints = match object.get("waypoints") {
        None => return Err(IngestError::malformed("waypoints", "is missing")),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| waypoint(entry, i))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(IngestError::malformed("waypoints", "must be an array")),
    };

    let start_coordinates = optional_coordinates(object, "startCoordinates")?;
    let end_coordinates = optional_coordinates(object, "endCoordinates")?;
    let id = optional_string(object, "id", "id")?;
    let description = optional_string(object, "description", "description")?;

    Ok(TripData {
        id,
        title,
        description,
        start_location,
        end_location,
        start_coordinates,
        end_coordinates,
        waypoints,
    })
}

fn waypoint(entry: &Value, index: usize) -> Result<Waypoint, IngestError> {
    let Some(object) = entry.as_object() else {
        return Err(IngestError::malformed(format!("waypoints[{index}]"), "must be an object"));
    };

    let name = match object.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(_) => return Err(IngestError::malformed(format!("waypoints[{index}].name"), "must be a string")),
        None => return Err(IngestError::malformed(format!("waypoints[{index}].name"), "is missing")),
    };

    let field = format!("waypoints[{index}].coordinates");
    let coordinates = match object.get("coordinates") {
        Some(value) => coordinates(value, &field)?,
        None => return Err(IngestError::malformed(field, "is missing")),
    };

    let kind = optional_string(object, "type", &format!("waypoints[{index}].type"))?;
    let description = optional_string(object, "description", &format!("waypoints[{index}].description"))?;

    Ok(Waypoint {
        name,
        coordinates,
        kind,
        description,
    })
}

fn string_field(object: &serde_json::Map<String, Value>, field: &'static str) -> Result<String, IngestError> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(IngestError::malformed(field, "must be a string")),
        None => Err(IngestError::malformed(field, "is missing")),
    }
}

/// `path` is what gets reported, `key` is looked up in `object`.
fn optional_string(object: &serde_json::Map<String, Value>, key: &str, path: &str) -> Result<Option<String>, IngestError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(IngestError::malformed(path, "must be a string")),
    }
}

fn optional_coordinates(object: &serde_json::Map<String, Value>, field: &'static str) -> Result<Option<LngLat>, IngestError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coordinates(value, field).map(Some),
    }
}

fn coordinates(value: &Value, field: &str) -> Result<LngLat, IngestError> {
    let pair = match value.as_array().map(Vec::as_slice) {
        Some([lng, lat]) => lng.as_f64().zip(lat.as_f64()),
        _ => return Err(IngestError::malformed(field, "must be a [longitude, latitude] pair")),
    };

    match pair {
        Some((lng, lat)) if lng.is_finite() && lat.is_finite() => Ok([lng, lat]),
        _ => Err(IngestError::malformed(field, "must contain two numbers")),
    }
}
