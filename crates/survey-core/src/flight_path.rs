//! Waypoint generation: turns a survey polygon into an ordered flight path.

use tracing::debug;

use crate::geo::{order_by_centroid_angle, subdivide};
use crate::models::{Coordinate, MissionParameters, SurveyPattern, Waypoint};

/// Minimum polygon size for generation; smaller areas yield no waypoints.
pub const MIN_AREA_POINTS: usize = 3;

/// Generate the ordered waypoint sequence for a survey area.
///
/// Polygon points are ordered by the centroid-angle heuristic, then each
/// consecutive edge is subdivided using `capture_frequency_s` as spacing
/// (in meters) and the pieces concatenated in edge order. Every waypoint
/// carries the configured altitude and a 0-based sequence index.
///
/// Areas with fewer than [`MIN_AREA_POINTS`] points produce an empty
/// sequence without erroring; reporting that condition is the lifecycle's
/// job. Generation is deterministic: identical inputs produce an identical
/// sequence.
///
/// Pattern dispatch is a known gap: `grid`, `crosshatch`, and `custom` all
/// currently share the open-ring edge-subdivision strategy. Only
/// `perimeter` differs, closing the ring back to the first ordered vertex.
pub fn generate_waypoints(
    survey_area: &[Coordinate],
    pattern: SurveyPattern,
    params: &MissionParameters,
) -> Vec<Waypoint> {
    if survey_area.len() < MIN_AREA_POINTS {
        debug!(
            points = survey_area.len(),
            "survey area below minimum, no waypoints generated"
        );
        return Vec::new();
    }

    let spacing = params.capture_frequency_s;
    let points = match pattern {
        SurveyPattern::Grid | SurveyPattern::Crosshatch | SurveyPattern::Custom => {
            open_ring_sweep(survey_area, spacing)
        }
        SurveyPattern::Perimeter => perimeter_sweep(survey_area, spacing),
    };

    points
        .into_iter()
        .enumerate()
        .map(|(i, coordinates)| Waypoint::new(coordinates, params.altitude_m, i))
        .collect()
}

/// Subdivide edges `(p0,p1), (p1,p2), ..., (p_{n-2}, p_{n-1})` of the
/// centroid-ordered ring. The closing edge back to `p0` is not added unless
/// the input already repeats it.
fn open_ring_sweep(survey_area: &[Coordinate], spacing: f64) -> Vec<Coordinate> {
    let ordered = order_by_centroid_angle(survey_area);
    let mut points = Vec::new();
    for edge in ordered.windows(2) {
        points.extend(subdivide(edge[0], edge[1], spacing));
    }
    points
}

/// Like [`open_ring_sweep`], plus the closing edge from the last ordered
/// vertex back to the first.
fn perimeter_sweep(survey_area: &[Coordinate], spacing: f64) -> Vec<Coordinate> {
    let ordered = order_by_centroid_angle(survey_area);
    let mut points = Vec::new();
    for edge in ordered.windows(2) {
        points.extend(subdivide(edge[0], edge[1], spacing));
    }
    if let (Some(&last), Some(&first)) = (ordered.last(), ordered.first()) {
        points.extend(subdivide(last, first, spacing));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.001, 0.0),
        ]
    }

    #[test]
    fn undersized_area_yields_no_waypoints() {
        let params = MissionParameters::default();
        assert!(generate_waypoints(&[], SurveyPattern::Grid, &params).is_empty());
        let two = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)];
        assert!(generate_waypoints(&two, SurveyPattern::Grid, &params).is_empty());
    }

    #[test]
    fn grid_pattern_covers_the_square() {
        let params = MissionParameters::default();
        let waypoints = generate_waypoints(&square(), SurveyPattern::Grid, &params);
        assert!(!waypoints.is_empty());
        // Three edges of ~111m at 5m spacing: well over 20 points.
        assert!(waypoints.len() > 20, "got {}", waypoints.len());
    }

    #[test]
    fn waypoints_carry_altitude_and_sequential_indices() {
        let params = MissionParameters {
            altitude_m: 80.0,
            ..MissionParameters::default()
        };
        let waypoints = generate_waypoints(&square(), SurveyPattern::Grid, &params);
        for (i, wp) in waypoints.iter().enumerate() {
            assert_eq!(wp.sequence_index, i);
            assert_eq!(wp.altitude_m, 80.0);
            assert_eq!(wp.id, format!("wp-{i:04}"));
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let params = MissionParameters::default();
        let first = generate_waypoints(&square(), SurveyPattern::Grid, &params);
        let second = generate_waypoints(&square(), SurveyPattern::Grid, &params);
        assert_eq!(first, second);
    }

    #[test]
    fn perimeter_pattern_closes_the_ring() {
        let params = MissionParameters::default();
        let open = generate_waypoints(&square(), SurveyPattern::Grid, &params);
        let closed = generate_waypoints(&square(), SurveyPattern::Perimeter, &params);
        assert!(closed.len() > open.len());
        let ordered = order_by_centroid_angle(&square());
        assert_eq!(closed.last().unwrap().coordinates, ordered[0]);
    }

    #[test]
    fn crosshatch_and_custom_share_the_edge_sweep() {
        // Known gap: non-perimeter patterns have no distinct algorithm yet.
        let params = MissionParameters::default();
        let grid = generate_waypoints(&square(), SurveyPattern::Grid, &params);
        let crosshatch = generate_waypoints(&square(), SurveyPattern::Crosshatch, &params);
        let custom = generate_waypoints(&square(), SurveyPattern::Custom, &params);
        assert_eq!(grid, crosshatch);
        assert_eq!(grid, custom);
    }
}
