use track_lib::{
    geometry::{LngLat, LngLatBounds},
    Track,
};

use crate::renderer::{FitBoundsOptions, FlyToOptions, MapRenderer, SharedRenderer};

pub const TRACK_PADDING_PX: f64 = 50.;
pub const TRACK_MAX_ZOOM: f64 = 15.;

/// Moves the camera. Every request is animated and a newer one replaces whatever is in flight.
pub struct ViewportFitter<R> {
    renderer: SharedRenderer<R>,
}

impl<R: MapRenderer> ViewportFitter<R> {
    pub fn new(renderer: SharedRenderer<R>) -> Self {
        Self { renderer }
    }

    /// Frames all `points`. Returns the bounds used, or `None` (and does nothing) when there
    /// are no points.
    pub fn fit_to_points(&self, points: &[LngLat], padding_px: f64, max_zoom: Option<f64>) -> Option<LngLatBounds> {
        let bounds = LngLatBounds::from_points(points.iter().copied())?;
        self.fit_bounds(bounds, padding_px, max_zoom);
        Some(bounds)
    }

    pub fn fit_to_track(&self, track: &Track) -> Option<LngLatBounds> {
        let bounds = LngLatBounds::from_points(track.points().map(|point| point.lng_lat()))?;
        self.fit_bounds(bounds, TRACK_PADDING_PX, Some(TRACK_MAX_ZOOM));
        Some(bounds)
    }

    pub fn fly_to(&self, point: LngLat, zoom: f64) {
        tracing::debug!("Flying to {:?} at zoom {}", point, zoom);
        self.renderer.borrow_mut().fly_to(point.into(), zoom, &FlyToOptions { animate: true });
    }

    fn fit_bounds(&self, bounds: LngLatBounds, padding_px: f64, max_zoom: Option<f64>) {
        tracing::debug!("Fitting viewport to {:?}", bounds);
        let options = FitBoundsOptions {
            padding: padding_px,
            max_zoom,
            animate: true,
        };
        self.renderer.borrow_mut().fit_bounds(&bounds, &options);
    }
}

#[cfg(test)]
mod tests {
    use track_lib::{TrackPoint, TrackSegment};

    use super::*;
    use crate::{
        recording::{RecordingRenderer, RendererCall},
        renderer::shared,
    };

    #[test]
    fn empty_input_is_a_no_op() {
        let renderer = shared(RecordingRenderer::ready());
        let viewport = ViewportFitter::new(renderer.clone());

        assert_eq!(viewport.fit_to_points(&[], 50., None), None);
        assert!(renderer.borrow().calls.is_empty());
    }

    #[test]
    fn fits_with_padding_and_zoom_ceiling() {
        let renderer = shared(RecordingRenderer::ready());
        let viewport = ViewportFitter::new(renderer.clone());

        viewport.fit_to_points(&[[9.1829, 48.7758], [7.8522, 47.9990], [8.4037, 48.53]], 40., Some(12.));

        let (bounds, options) = renderer.borrow().last_fit().unwrap();
        assert_eq!(bounds, LngLatBounds { west: 7.8522, south: 47.9990, east: 9.1829, north: 48.7758 });
        assert_eq!(options, FitBoundsOptions { padding: 40., max_zoom: Some(12.), animate: true });
    }

    #[test]
    fn single_point_gives_a_degenerate_box() {
        let renderer = shared(RecordingRenderer::ready());
        let viewport = ViewportFitter::new(renderer.clone());

        let bounds = viewport.fit_to_points(&[[10., 56.]], 0., None).unwrap();
        assert_eq!(bounds, LngLatBounds::from_point([10., 56.]));
    }

    #[test]
    fn route_across_the_antimeridian_stays_narrow() {
        let renderer = shared(RecordingRenderer::ready());
        let viewport = ViewportFitter::new(renderer.clone());

        let bounds = viewport.fit_to_points(&[[178.9, -17.7], [179.8, -17.2], [-179.6, -16.8]], 50., None).unwrap();
        assert!(bounds.east - bounds.west < 2., "{bounds:?}");
    }

    #[test]
    fn fit_to_track_uses_every_segment() {
        let renderer = shared(RecordingRenderer::ready());
        let viewport = ViewportFitter::new(renderer.clone());
        let track = Track::new(
            "two legs".into(),
            vec![
                TrackSegment::new(vec![TrackPoint::new(56., 10., None), TrackPoint::new(56.1, 10.2, None)]),
                TrackSegment::new(vec![TrackPoint::new(55.5, 9.5, None)]),
            ],
        );

        viewport.fit_to_track(&track);

        let (bounds, options) = renderer.borrow().last_fit().unwrap();
        assert_eq!(bounds, LngLatBounds { west: 9.5, south: 55.5, east: 10.2, north: 56.1 });
        assert_eq!(options.max_zoom, Some(TRACK_MAX_ZOOM));
        assert_eq!(options.padding, TRACK_PADDING_PX);

        assert_eq!(viewport.fit_to_track(&Track::new("empty".into(), Vec::new())), None);
    }

    #[test]
    fn later_requests_are_issued_in_order() {
        let renderer = shared(RecordingRenderer::ready());
        let viewport = ViewportFitter::new(renderer.clone());

        viewport.fit_to_points(&[[1., 1.], [2., 2.]], 10., None);
        viewport.fly_to([12.5683, 55.6761], 9.);

        let calls = renderer.borrow().calls.clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], RendererCall::FlyTo([12.5683, 55.6761].into(), 9.));
    }
}
