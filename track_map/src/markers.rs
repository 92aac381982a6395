use std::collections::HashMap;

use track_lib::geometry::LngLat;

use crate::renderer::{MapRenderer, MarkerElement, MarkerHandle, RendererError, SharedRenderer};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerStyle {
    Start,
    End,
    Waypoint,
    Custom { color: String },
}

impl MarkerStyle {
    fn element(&self, label: &str) -> MarkerElement {
        let (color, class_name) = match self {
            Self::Start => ("#32CD32", "marker-start"),
            Self::End => ("#DC143C", "marker-end"),
            Self::Waypoint => ("#3887be", "marker-waypoint"),
            Self::Custom { color } => (color.as_str(), "marker"),
        };

        MarkerElement {
            label: label.to_string(),
            color: color.to_string(),
            class_name,
        }
    }
}

struct PlacedMarker {
    handle: MarkerHandle,
    coordinates: LngLat,
}

/// Markers keyed by a caller-chosen string. Only touches markers it placed itself.
pub struct MarkerManager<R> {
    renderer: SharedRenderer<R>,
    markers: HashMap<String, PlacedMarker>,
}

impl<R: MapRenderer> MarkerManager<R> {
    pub fn new(renderer: SharedRenderer<R>) -> Self {
        Self {
            renderer,
            markers: HashMap::new(),
        }
    }

    /// Places a marker under `key`, replacing the previous one. The old marker is removed
    /// before the new one is added, even if adding then fails.
    pub fn set_marker(&mut self, key: &str, coordinates: LngLat, label: &str, style: MarkerStyle) -> Result<MarkerHandle, RendererError> {
        self.remove_marker(key);

        let handle = self.renderer.borrow_mut().add_marker(key, coordinates.into(), &style.element(label))?;
        self.markers.insert(key.to_string(), PlacedMarker { handle, coordinates });
        Ok(handle)
    }

    /// Returns false when there was no marker under `key`.
    pub fn remove_marker(&mut self, key: &str) -> bool {
        match self.markers.remove(key) {
            Some(marker) => {
                self.renderer.borrow_mut().remove_marker(marker.handle);
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        let mut renderer = self.renderer.borrow_mut();
        for (_, marker) in self.markers.drain() {
            renderer.remove_marker(marker.handle);
        }
    }

    pub fn position(&self, key: &str) -> Option<LngLat> {
        self.markers.get(key).map(|marker| marker.coordinates)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
