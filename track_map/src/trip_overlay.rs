use track_lib::{geometry::LngLat, TripData};

use crate::{
    markers::{MarkerManager, MarkerStyle},
    renderer::{MapRenderer, SharedRenderer},
    viewport::ViewportFitter,
};

pub const TRIP_PADDING_PX: f64 = 50.;
pub const TRIP_MAX_ZOOM: f64 = 12.;

/// Shows a planned trip as start, end and waypoint markers.
pub struct TripOverlay<R> {
    markers: MarkerManager<R>,
    viewport: ViewportFitter<R>,
}

impl<R: MapRenderer> TripOverlay<R> {
    pub fn new(renderer: SharedRenderer<R>) -> Self {
        Self {
            markers: MarkerManager::new(renderer.clone()),
            viewport: ViewportFitter::new(renderer),
        }
    }

    /// Replaces whatever trip was shown before. Markers the renderer refuses are skipped and
    /// left out of the framing.
    pub fn show(&mut self, trip: &TripData) {
        self.markers.clear_all();

        let mut placed: Vec<LngLat> = Vec::new();

        if let Some(start) = trip.start_coordinates {
            self.place("start", start, &trip.start_location, MarkerStyle::Start, &mut placed);
        }

        for (index, waypoint) in trip.waypoints.iter().enumerate() {
            let key = format!("waypoint-{index}");
            self.place(&key, waypoint.coordinates, &waypoint.name, MarkerStyle::Waypoint, &mut placed);
        }

        if let Some(end) = trip.end_coordinates {
            self.place("end", end, &trip.end_location, MarkerStyle::End, &mut placed);
        }

        tracing::info!("Showing trip '{}' with {} markers", trip.title, placed.len());
        self.viewport.fit_to_points(&placed, TRIP_PADDING_PX, Some(TRIP_MAX_ZOOM));
    }

    pub fn clear(&mut self) {
        self.markers.clear_all();
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    fn place(&mut self, key: &str, coordinates: LngLat, label: &str, style: MarkerStyle, placed: &mut Vec<LngLat>) {
        match self.markers.set_marker(key, coordinates, label, style) {
            Ok(_) => placed.push(coordinates),
            Err(e) => tracing::warn!("Could not place marker '{}': {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use track_lib::{geometry::LngLatBounds, Waypoint};

    use super::*;
    use crate::{recording::RecordingRenderer, renderer::shared};

    fn alpine_trip() -> TripData {
        TripData {
            id: Some("alps-1".into()),
            title: "Alpine loop".into(),
            description: None,
            start_location: "Innsbruck".into(),
            end_location: "Bolzano".into(),
            start_coordinates: Some([11.4041, 47.2692]),
            end_coordinates: Some([11.3548, 46.4983]),
            waypoints: vec![
                Waypoint::new("Brenner", [11.5075, 47.0023]),
                Waypoint::new("Sterzing", [11.4307, 46.8965]),
            ],
        }
    }

    #[test]
    fn places_markers_and_frames_them() {
        let renderer = shared(RecordingRenderer::ready());
        let mut overlay = TripOverlay::new(renderer.clone());

        overlay.show(&alpine_trip());

        let r = renderer.borrow();
        assert_eq!(r.markers.len(), 4);
        assert_eq!(r.markers_at([11.4041, 47.2692])[0].element.color, "#32CD32");
        assert_eq!(r.markers_at([11.3548, 46.4983])[0].element.color, "#DC143C");
        let brenner = r.markers_at([11.5075, 47.0023])[0];
        assert_eq!(brenner.id, "waypoint-0");
        assert_eq!(brenner.element.label, "Brenner");

        let (bounds, options) = r.last_fit().unwrap();
        assert_eq!(bounds, LngLatBounds { west: 11.3548, south: 46.4983, east: 11.5075, north: 47.2692 });
        assert_eq!(options.padding, TRIP_PADDING_PX);
        assert_eq!(options.max_zoom, Some(TRIP_MAX_ZOOM));
    }

    #[test]
    fn new_trip_replaces_the_old_one() {
        let renderer = shared(RecordingRenderer::ready());
        let mut overlay = TripOverlay::new(renderer.clone());
        overlay.show(&alpine_trip());

        let mut short = alpine_trip();
        short.waypoints.truncate(1);
        short.end_coordinates = None;
        overlay.show(&short);

        assert_eq!(overlay.marker_count(), 2);
        assert_eq!(renderer.borrow().markers.len(), 2);
    }

    #[test]
    fn trip_without_coordinates_does_not_move_the_camera() {
        let renderer = shared(RecordingRenderer::ready());
        let mut overlay = TripOverlay::new(renderer.clone());
        let trip = TripData {
            start_coordinates: None,
            end_coordinates: None,
            waypoints: Vec::new(),
            ..alpine_trip()
        };

        overlay.show(&trip);

        assert_eq!(renderer.borrow().last_fit(), None);
        assert_eq!(overlay.marker_count(), 0);
    }

    #[test]
    fn rejected_marker_is_left_out_of_the_framing() {
        let renderer = shared(RecordingRenderer::ready());
        renderer.borrow_mut().fail_on("end");
        let mut overlay = TripOverlay::new(renderer.clone());

        overlay.show(&alpine_trip());

        let r = renderer.borrow();
        assert_eq!(r.markers.len(), 3);
        let (bounds, _) = r.last_fit().unwrap();
        assert_eq!(bounds.south, 46.8965);
    }

    #[test]
    fn clear_removes_every_marker() {
        let renderer = shared(RecordingRenderer::ready());
        let mut overlay = TripOverlay::new(renderer.clone());
        overlay.show(&alpine_trip());

        overlay.clear();

        assert!(renderer.borrow().markers.is_empty());
    }
}
