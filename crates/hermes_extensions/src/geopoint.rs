use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_METERS;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        GeoPoint { lat, lng: lon }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lng
    }

    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Linear interpolation in coordinate space, good enough over a single edge segment.
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        GeoPoint::new(
            self.lng + fraction * (other.lng - self.lng),
            self.lat + fraction * (other.lat - self.lat),
        )
    }
}

impl From<&GeoPoint> for geo::Coord {
    fn from(value: &GeoPoint) -> Self {
        geo::Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

impl From<GeoPoint> for geo::Coord {
    fn from(value: GeoPoint) -> Self {
        (&value).into()
    }
}

impl From<&GeoPoint> for geo::Point {
    fn from(value: &GeoPoint) -> Self {
        geo::Point::new(value.lng, value.lat)
    }
}

impl From<geo::Point> for GeoPoint {
    fn from(value: geo::Point) -> Self {
        GeoPoint::new(value.x(), value.y())
    }
}

impl From<&GeoPoint> for [f64; 2] {
    fn from(value: &GeoPoint) -> Self {
        [value.lng, value.lat]
    }
}
