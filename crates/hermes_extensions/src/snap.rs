use crate::{geopoint::GeoPoint, types::EdgeId};

/// A location projected on an edge of the base graph.
#[derive(Debug, Clone, Copy)]
pub struct Snap {
    pub edge_id: EdgeId,
    pub coordinates: GeoPoint,
    /// Meters between the queried location and `coordinates`
    pub distance: f64,
}

impl Snap {
    pub fn new(edge_id: EdgeId, coordinates: GeoPoint, distance: f64) -> Self {
        Snap {
            edge_id,
            coordinates,
            distance,
        }
    }
}
