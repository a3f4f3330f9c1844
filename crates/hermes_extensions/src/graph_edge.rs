use crate::{
    geopoint::GeoPoint,
    types::{EdgeId, NodeId, OsmNodeId, OsmWayId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    id: EdgeId,
    start_node: NodeId,
    end_node: NodeId,
    distance: f64,
    way_id: OsmWayId,
}

impl GraphEdge {
    pub fn new(
        id: EdgeId,
        start_node: NodeId,
        end_node: NodeId,
        distance: f64,
        way_id: OsmWayId,
    ) -> Self {
        GraphEdge {
            id,
            start_node,
            end_node,
            distance,
            way_id,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn start_node(&self) -> NodeId {
        self.start_node
    }

    pub fn end_node(&self) -> NodeId {
        self.end_node
    }

    /// Id of the source way this edge was split from
    pub fn way_id(&self) -> OsmWayId {
        self.way_id
    }

    pub fn adj_node(&self, node: NodeId) -> NodeId {
        if self.start_node == node {
            self.end_node
        } else {
            self.start_node
        }
    }
}

/// An edge as seen by the edge phase of the graph storage builders, with the way nodes at both
/// ends. `reversed` is set when base and adjacent node run against the way direction.
#[derive(Debug, Clone, Copy)]
pub struct EdgeState<'a> {
    pub id: EdgeId,
    pub base_node: NodeId,
    pub adj_node: NodeId,
    pub base_osm_node: OsmNodeId,
    pub adj_osm_node: OsmNodeId,
    pub distance: f64,
    pub reversed: bool,
    pub geometry: &'a [GeoPoint],
}
