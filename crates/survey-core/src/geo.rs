//! Geometry kernel: bounding boxes, polygon ordering, great-circle
//! distance, and line subdivision.
//!
//! Everything here is a pure function over [`Coordinate`]s. Malformed but
//! well-typed input degrades to empty/degenerate results instead of
//! erroring; interpretation is left to the lifecycle layer.

use crate::models::{BoundingBox, Coordinate};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Compute the axis-aligned bounds of a polygon.
///
/// An empty polygon yields the degenerate box `{north: -90, south: 90,
/// east: -180, west: 180}`; callers that rely on the box for area logic
/// must guard on polygon length first.
pub fn bounding_box(polygon: &[Coordinate]) -> BoundingBox {
    let mut bounds = BoundingBox {
        north: -90.0,
        south: 90.0,
        east: -180.0,
        west: 180.0,
    };
    for point in polygon {
        bounds.north = bounds.north.max(point.lat);
        bounds.south = bounds.south.min(point.lat);
        bounds.east = bounds.east.max(point.lng);
        bounds.west = bounds.west.min(point.lng);
    }
    bounds
}

/// Arithmetic-mean centroid of a point set.
///
/// Returns `None` for an empty set.
pub fn centroid(polygon: &[Coordinate]) -> Option<Coordinate> {
    if polygon.is_empty() {
        return None;
    }
    let n = polygon.len() as f64;
    let sum_lat: f64 = polygon.iter().map(|p| p.lat).sum();
    let sum_lng: f64 = polygon.iter().map(|p| p.lng).sum();
    Some(Coordinate::new(sum_lat / n, sum_lng / n))
}

/// Order polygon points by angle around the arithmetic-mean centroid.
///
/// This is a heuristic ordering, not a true polygon simplification: it
/// yields a non-self-intersecting ring only for polygons that are
/// star-shaped around their centroid. Concave inputs may still produce a
/// self-intersecting ring. The sort is stable, so points at equal angles
/// keep their original relative order and repeated calls with the same
/// input produce the same output.
pub fn order_by_centroid_angle(polygon: &[Coordinate]) -> Vec<Coordinate> {
    let Some(center) = centroid(polygon) else {
        return Vec::new();
    };

    let mut ordered = polygon.to_vec();
    ordered.sort_by(|a, b| {
        let angle_a = (a.lat - center.lat).atan2(a.lng - center.lng);
        let angle_b = (b.lat - center.lat).atan2(b.lng - center.lng);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ordered
}

/// Great-circle distance between two points in meters (Haversine formula).
///
/// Spherical approximation with a 6,371 km Earth radius; accurate to what
/// that radius implies, not ellipsoidal.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Subdivide the segment from `a` to `b` into points at most `spacing`
/// meters apart.
///
/// The output always starts with `a` and ends with exactly `b`. If the
/// segment is no longer than `spacing` (or `spacing` is not positive), the
/// output is just `[a, b]`; otherwise the segment is split into
/// `floor(distance / spacing)` equal parts. Interpolation is linear in
/// lat/lng space rather than along the great circle, a deliberate
/// simplification valid at survey scales.
pub fn subdivide(a: Coordinate, b: Coordinate, spacing: f64) -> Vec<Coordinate> {
    let distance = haversine_distance(a, b);
    if spacing <= 0.0 || distance <= spacing {
        return vec![a, b];
    }

    let segments = (distance / spacing).floor() as usize;
    let mut points = Vec::with_capacity(segments + 1);
    points.push(a);
    for i in 1..segments {
        let fraction = i as f64 / segments as f64;
        points.push(Coordinate::new(
            a.lat + fraction * (b.lat - a.lat),
            a.lng + fraction * (b.lng - a.lng),
        ));
    }
    // Close to b exactly rather than through interpolation residue.
    points.push(b);
    points
}
