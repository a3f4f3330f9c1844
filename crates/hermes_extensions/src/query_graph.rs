use fxhash::FxHashMap;

use crate::{
    geometry::{PolylineProjection, compute_geometry_distance, project_point, split_geometry},
    geopoint::GeoPoint,
    graph::GraphAccess,
    graph_edge::GraphEdge,
    snap::Snap,
    types::{EdgeId, NodeId},
};

/// Snaps closer than this to an existing point of the edge do not create a virtual node.
const SPLIT_TOLERANCE_METERS: f64 = 0.01;

/// Overlay on a base graph where edges are cut at snapped locations.
///
/// Virtual nodes get ids starting at the base node count and virtual edges ids starting at the
/// base edge count. An edge snapped several times is replaced by a chain of virtual pieces, all
/// stored in the orientation of the edge they were cut from.
pub struct QueryGraph<'a, G: GraphAccess + ?Sized> {
    base_graph: &'a G,

    virtual_nodes: usize,
    virtual_edges: Vec<GraphEdge>,
    virtual_edge_geometry: Vec<Vec<GeoPoint>>,
    virtual_adjacency_list: Vec<Vec<EdgeId>>,
    original_edges: Vec<EdgeId>,

    pieces: FxHashMap<EdgeId, Vec<EdgeId>>,
}

impl<'a, G: GraphAccess + ?Sized> QueryGraph<'a, G> {
    pub fn from_base_graph(base_graph: &'a G, snaps: &[Snap]) -> Self {
        let mut query_graph = QueryGraph {
            base_graph,
            virtual_nodes: 0,
            virtual_edges: Vec::new(),
            virtual_edge_geometry: Vec::new(),
            virtual_adjacency_list: Vec::new(),
            original_edges: Vec::new(),
            pieces: FxHashMap::default(),
        };

        let mut projections: FxHashMap<EdgeId, Vec<PolylineProjection>> = FxHashMap::default();
        for snap in snaps {
            let geometry = base_graph.edge_geometry(snap.edge_id);
            if let Some(projection) = project_point(geometry, &snap.coordinates) {
                projections.entry(snap.edge_id).or_default().push(projection);
            }
        }

        let mut edge_ids: Vec<EdgeId> = projections.keys().copied().collect();
        edge_ids.sort_unstable();

        for edge_id in edge_ids {
            let Some(mut edge_projections) = projections.remove(&edge_id) else {
                continue;
            };
            let length = compute_geometry_distance(base_graph.edge_geometry(edge_id));

            edge_projections.sort_by(|a, b| a.offset.total_cmp(&b.offset));
            edge_projections.retain(|projection| {
                projection.offset > SPLIT_TOLERANCE_METERS
                    && projection.offset < length - SPLIT_TOLERANCE_METERS
            });
            edge_projections
                .dedup_by(|a, b| (a.offset - b.offset).abs() < SPLIT_TOLERANCE_METERS);

            if !edge_projections.is_empty() {
                query_graph.split_edge(edge_id, &edge_projections);
            }
        }

        query_graph
    }

    fn split_edge(&mut self, edge_id: EdgeId, projections: &[PolylineProjection]) {
        let edge = self.base_graph.edge(edge_id);
        let (start_node, end_node, way_id) = (edge.start_node(), edge.end_node(), edge.way_id());
        let geometries = split_geometry(self.base_graph.edge_geometry(edge_id), projections);

        let first_virtual_node = self.base_graph.node_count() + self.virtual_nodes;
        let mut nodes = Vec::with_capacity(projections.len() + 2);
        nodes.push(start_node);
        nodes.extend((0..projections.len()).map(|index| first_virtual_node + index));
        nodes.push(end_node);

        self.virtual_nodes += projections.len();
        self.virtual_adjacency_list
            .extend((0..projections.len()).map(|_| Vec::with_capacity(2)));

        let mut piece_ids = Vec::with_capacity(geometries.len());

        for (index, geometry) in geometries.into_iter().enumerate() {
            let virtual_edge_id = self.base_graph.edge_count() + self.virtual_edges.len();
            let (from, to) = (nodes[index], nodes[index + 1]);

            self.virtual_edges.push(GraphEdge::new(
                virtual_edge_id,
                from,
                to,
                compute_geometry_distance(&geometry),
                way_id,
            ));
            self.virtual_edge_geometry.push(geometry);
            self.original_edges.push(edge_id);

            for node in [from, to] {
                if self.is_virtual_node(node) {
                    let virtual_node_id = self.virtual_node_id(node);
                    self.virtual_adjacency_list[virtual_node_id].push(virtual_edge_id);
                }
            }

            piece_ids.push(virtual_edge_id);
        }

        self.pieces.insert(edge_id, piece_ids);
    }

    pub fn is_virtual_edge(&self, edge_id: EdgeId) -> bool {
        edge_id >= self.base_graph.edge_count()
    }

    pub fn is_virtual_node(&self, node_id: NodeId) -> bool {
        node_id >= self.base_graph.node_count()
    }

    pub fn base_graph(&self) -> &G {
        self.base_graph
    }

    // Assumes node_id is a virtual node
    fn virtual_node_id(&self, node_id: NodeId) -> usize {
        node_id - self.base_graph.node_count()
    }

    // Assumes edge_id is a virtual edge
    fn virtual_edge_id(&self, edge_id: EdgeId) -> usize {
        edge_id - self.base_graph.edge_count()
    }

    /// Base edge a virtual edge was cut from, or the edge itself.
    pub fn original_edge(&self, edge_id: EdgeId) -> EdgeId {
        if self.is_virtual_edge(edge_id) {
            self.original_edges[self.virtual_edge_id(edge_id)]
        } else {
            edge_id
        }
    }

    /// Edges covering a base edge: its virtual pieces in order when it was split, itself otherwise.
    pub fn edge_pieces(&self, edge_id: EdgeId) -> Vec<EdgeId> {
        self.pieces
            .get(&edge_id)
            .cloned()
            .unwrap_or_else(|| vec![edge_id])
    }
}

impl<G: GraphAccess + ?Sized> GraphAccess for QueryGraph<'_, G> {
    fn edge_count(&self) -> usize {
        self.base_graph.edge_count() + self.virtual_edges.len()
    }

    fn node_count(&self) -> usize {
        self.base_graph.node_count() + self.virtual_nodes
    }

    fn edge(&self, edge_id: EdgeId) -> &GraphEdge {
        if self.is_virtual_edge(edge_id) {
            &self.virtual_edges[self.virtual_edge_id(edge_id)]
        } else {
            self.base_graph.edge(edge_id)
        }
    }

    fn edge_geometry(&self, edge_id: EdgeId) -> &[GeoPoint] {
        if self.is_virtual_edge(edge_id) {
            &self.virtual_edge_geometry[self.virtual_edge_id(edge_id)]
        } else {
            self.base_graph.edge_geometry(edge_id)
        }
    }

    fn node_edges(&self, node_id: NodeId) -> &[EdgeId] {
        if self.is_virtual_node(node_id) {
            &self.virtual_adjacency_list[self.virtual_node_id(node_id)]
        } else {
            self.base_graph.node_edges(node_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::straight_line_graph;

    #[test]
    fn test_single_snap_splits_edge_in_two() {
        let graph = straight_line_graph();
        let snap = Snap::new(0, GeoPoint::new(4.0005, 50.0001), 11.0);

        let query_graph = QueryGraph::from_base_graph(&graph, &[snap]);

        assert_eq!(query_graph.node_count(), graph.node_count() + 1);
        assert_eq!(query_graph.edge_count(), graph.edge_count() + 2);

        let pieces = query_graph.edge_pieces(0);
        assert_eq!(pieces, vec![graph.edge_count(), graph.edge_count() + 1]);

        let first = query_graph.edge(pieces[0]);
        let second = query_graph.edge(pieces[1]);
        assert_eq!(first.start_node(), graph.edge(0).start_node());
        assert_eq!(first.end_node(), second.start_node());
        assert_eq!(second.end_node(), graph.edge(0).end_node());
        assert!(query_graph.is_virtual_node(first.end_node()));
        assert_eq!(query_graph.node_edges(first.end_node()), &pieces[..]);

        let total = first.distance() + second.distance();
        assert!((total - graph.edge(0).distance()).abs() < 0.01);
        assert_eq!(query_graph.original_edge(pieces[1]), 0);
    }

    #[test]
    fn test_multiple_snaps_create_a_chain() {
        let graph = straight_line_graph();
        let snaps = [
            Snap::new(0, GeoPoint::new(4.0007, 50.0), 0.0),
            Snap::new(0, GeoPoint::new(4.0003, 50.0), 0.0),
            Snap::new(0, GeoPoint::new(4.0003, 50.0), 0.0),
        ];

        let query_graph = QueryGraph::from_base_graph(&graph, &snaps);
        let pieces = query_graph.edge_pieces(0);

        assert_eq!(pieces.len(), 3);
        assert!(query_graph.edge_geometry(pieces[0])[1].lon() < 4.0004);
        assert!(query_graph.edge_geometry(pieces[2])[0].lon() > 4.0006);
    }

    #[test]
    fn test_snap_on_tower_node_does_not_split() {
        let graph = straight_line_graph();
        let start = graph.edge_geometry(1)[0];

        let query_graph = QueryGraph::from_base_graph(&graph, &[Snap::new(1, start, 0.0)]);

        assert_eq!(query_graph.edge_count(), graph.edge_count());
        assert_eq!(query_graph.edge_pieces(1), vec![1]);
    }
}
