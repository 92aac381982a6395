use crate::{geometry::distance_km, track::TrackSegment};

/// Distance in km along every segment, rounded to 2 decimals.
///
/// Segments are separate legs, so nothing is added for the gap between the end of one
/// segment and the start of the next.
pub fn total_distance(segments: &[TrackSegment]) -> f64 {
    let total: f64 = segments.iter().map(segment_distance).sum();
    (total * 100.).round() / 100.
}

pub fn segment_distance(segment: &TrackSegment) -> f64 {
    segment
        .points
        .windows(2)
        .map(|pair| distance_km(pair[0].latitude, pair[0].longitude, pair[1].latitude, pair[1].longitude))
        .sum()
}

/// Sum of all climbs in meters, rounded to the nearest meter. Descents are ignored.
///
/// A pair of points contributes only if both carry an elevation. Returns `None` when nothing
/// was climbed, which also covers tracks without any elevation data; the two cases are
/// not told apart.
pub fn elevation_gain(segments: &[TrackSegment]) -> Option<f64> {
    let total: f64 = segments
        .iter()
        .flat_map(|segment| segment.points.windows(2))
        .filter_map(|pair| match (pair[0].elevation, pair[1].elevation) {
            (Some(prev), Some(curr)) if curr > prev => Some(curr - prev),
            _ => None,
        })
        .sum();

    if total > 0. { Some(total.round()) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track_point::TrackPoint;

    fn segment(points: &[(f64, f64, Option<f64>)]) -> TrackSegment {
        TrackSegment::new(points.iter().map(|&(lat, lon, ele)| TrackPoint::new(lat, lon, ele)).collect())
    }

    #[test]
    fn descents_are_not_subtracted() {
        let seg = segment(&[(0., 0., Some(100.)), (0., 0., Some(150.)), (0., 0., Some(90.)), (0., 0., Some(140.))]);
        assert_eq!(elevation_gain(&[seg]), Some(100.));
    }

    #[test]
    fn missing_elevation_breaks_the_pair() {
        let seg = segment(&[(0., 0., Some(100.)), (0., 0., None), (0., 0., Some(300.)), (0., 0., Some(310.))]);
        assert_eq!(elevation_gain(&[seg]), Some(10.));
    }

    #[test]
    fn flat_and_unknown_are_both_none() {
        let flat = segment(&[(0., 0., Some(20.)), (0., 1., Some(20.)), (0., 2., Some(5.))]);
        let unknown = segment(&[(0., 0., None), (0., 1., None)]);
        assert_eq!(elevation_gain(&[flat]), None);
        assert_eq!(elevation_gain(&[unknown]), None);
        assert_eq!(elevation_gain(&[]), None);
    }

    #[test]
    fn gain_is_rounded() {
        let seg = segment(&[(0., 0., Some(10.2)), (0., 0., Some(12.9))]);
        assert_eq!(elevation_gain(&[seg]), Some(3.));
    }

    #[test]
    fn gain_does_not_bridge_segments() {
        let first = segment(&[(0., 0., Some(10.)), (0., 0., Some(20.))]);
        let second = segment(&[(0., 0., Some(500.)), (0., 0., Some(505.))]);
        assert_eq!(elevation_gain(&[first, second]), Some(15.));
    }

    #[test]
    fn distance_skips_gaps_between_segments() {
        let first = segment(&[(0., 0., None), (1., 0., None)]);
        let second = segment(&[(50., 0., None), (51., 0., None)]);
        let total = total_distance(&[first.clone(), second]);
        let single = total_distance(&[first]);
        assert!((total - 2. * single).abs() <= 0.011, "{total} vs {single}");
    }

    #[test]
    fn short_segments_have_no_distance() {
        assert_eq!(total_distance(&[segment(&[]), segment(&[(12., 55., None)])]), 0.);
    }

    #[test]
    fn distance_is_rounded_to_two_decimals() {
        let d = total_distance(&[segment(&[(0., 0., None), (0., 1., None)])]);
        assert_eq!(d, 111.19);
    }
}
