use geo::{Closest, ClosestPoint};

use crate::{constants::METERS_PER_DEGREE, geopoint::GeoPoint};

pub fn compute_geometry_distance(geometry: &[GeoPoint]) -> f64 {
    geometry
        .windows(2)
        .map(|window| window[0].haversine_distance(&window[1]))
        .sum()
}

/// Closest location of a point on a polyline.
#[derive(Debug, Clone, Copy)]
pub struct PolylineProjection {
    pub point: GeoPoint,
    /// Index of the segment `geometry[i]..geometry[i + 1]` holding `point`
    pub segment_index: usize,
    /// Distance in meters between the query point and `point`
    pub distance: f64,
    /// Distance in meters from the start of the polyline to `point`
    pub offset: f64,
}

fn closest_point_on_segment(start: &GeoPoint, end: &GeoPoint, point: &GeoPoint) -> GeoPoint {
    let line = geo::Line::new(geo::Coord::from(start), geo::Coord::from(end));

    match line.closest_point(&point.into()) {
        Closest::Intersection(closest) => closest.into(),
        Closest::SinglePoint(closest) => closest.into(),
        Closest::Indeterminate => *start,
    }
}

pub fn project_point(geometry: &[GeoPoint], point: &GeoPoint) -> Option<PolylineProjection> {
    if geometry.len() < 2 {
        return geometry.first().map(|first| PolylineProjection {
            point: *first,
            segment_index: 0,
            distance: first.haversine_distance(point),
            offset: 0.0,
        });
    }

    let mut best: Option<PolylineProjection> = None;
    let mut travelled = 0.0;

    for (segment_index, window) in geometry.windows(2).enumerate() {
        let closest = closest_point_on_segment(&window[0], &window[1], point);
        let distance = closest.haversine_distance(point);

        if best.is_none_or(|best| distance < best.distance) {
            best = Some(PolylineProjection {
                point: closest,
                segment_index,
                distance,
                offset: travelled + window[0].haversine_distance(&closest),
            });
        }

        travelled += window[0].haversine_distance(&window[1]);
    }

    best
}

/// Relative position (0 at the start, 1 at the end) of the projection of `point` on the polyline.
pub fn fraction_along(geometry: &[GeoPoint], point: &GeoPoint) -> Option<f64> {
    let length = compute_geometry_distance(geometry);
    if length <= 0.0 {
        return None;
    }

    project_point(geometry, point).map(|projection| projection.offset / length)
}

pub fn point_at_offset(geometry: &[GeoPoint], offset: f64) -> Option<GeoPoint> {
    let mut travelled = 0.0;

    for window in geometry.windows(2) {
        let segment_length = window[0].haversine_distance(&window[1]);
        if travelled + segment_length >= offset && segment_length > 0.0 {
            let fraction = ((offset - travelled) / segment_length).clamp(0.0, 1.0);
            return Some(window[0].interpolate(&window[1], fraction));
        }
        travelled += segment_length;
    }

    geometry.last().copied()
}

pub fn midpoint(geometry: &[GeoPoint]) -> Option<GeoPoint> {
    point_at_offset(geometry, compute_geometry_distance(geometry) / 2.0)
}

/// Splits a polyline at projected points, which must be sorted by offset.
/// Returns `projections.len() + 1` geometries sharing their split points.
pub fn split_geometry(geometry: &[GeoPoint], projections: &[PolylineProjection]) -> Vec<Vec<GeoPoint>> {
    let mut pieces = Vec::with_capacity(projections.len() + 1);
    let mut current = vec![geometry[0]];
    let mut next_vertex = 1;

    for projection in projections {
        while next_vertex <= projection.segment_index {
            current.push(geometry[next_vertex]);
            next_vertex += 1;
        }

        current.push(projection.point);
        pieces.push(current);
        current = vec![projection.point];
    }

    current.extend_from_slice(&geometry[next_vertex..]);
    pieces.push(current);

    pieces
}

/// Axis aligned bounding box of the geometry grown by `meters` on every side.
pub fn expanded_envelope(geometry: &[GeoPoint], meters: f64) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::MAX, f64::MAX];
    let mut max = [f64::MIN, f64::MIN];

    for point in geometry {
        min[0] = min[0].min(point.lon());
        min[1] = min[1].min(point.lat());
        max[0] = max[0].max(point.lon());
        max[1] = max[1].max(point.lat());
    }

    let lat_delta = meters / METERS_PER_DEGREE;
    let widest_latitude = min[1].abs().max(max[1].abs()).min(89.0);
    let lon_delta = meters / (METERS_PER_DEGREE * widest_latitude.to_radians().cos());

    (
        [min[0] - lon_delta, min[1] - lat_delta],
        [max[0] + lon_delta, max[1] + lat_delta],
    )
}
