use crate::{
    edge_direction::EdgeDirection,
    geopoint::GeoPoint,
    graph_edge::GraphEdge,
    types::{EdgeId, NodeId},
};

/// What the extension builders need from the routing graph.
pub trait GraphAccess {
    fn edge_count(&self) -> usize;

    fn node_count(&self) -> usize;

    fn edge(&self, edge_id: EdgeId) -> &GraphEdge;

    fn edge_geometry(&self, edge_id: EdgeId) -> &[GeoPoint];

    fn node_edges(&self, node_id: NodeId) -> &[EdgeId];

    fn edge_direction(&self, edge_id: EdgeId, start: NodeId) -> Option<EdgeDirection> {
        let edge = self.edge(edge_id);

        if edge.start_node() == start {
            Some(EdgeDirection::Forward)
        } else if edge.end_node() == start {
            Some(EdgeDirection::Backward)
        } else {
            None
        }
    }
}
