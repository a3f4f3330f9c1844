use fxhash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{
    geometry::compute_geometry_distance,
    geopoint::GeoPoint,
    graph::GraphAccess,
    graph_edge::{EdgeState, GraphEdge},
    osm::way::Way,
    types::{EdgeId, NodeId, OsmNodeId},
};

/// An edge created from a way, with the way nodes it was cut between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaySegment {
    pub edge_id: EdgeId,
    pub base_osm_node: OsmNodeId,
    pub adj_osm_node: OsmNodeId,
}

#[derive(Default)]
pub struct BaseGraph {
    nodes: usize,
    edges: Vec<GraphEdge>,
    geometry: Vec<Vec<GeoPoint>>,
    adjacency_list: Vec<Vec<EdgeId>>,
    osm_nodes: FxHashMap<OsmNodeId, NodeId>,
}

impl BaseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Way nodes where the graph has to be cut: nodes shared between ways, or visited twice by the same way.
    pub fn junction_nodes<'a>(ways: impl IntoIterator<Item = &'a Way>) -> FxHashSet<OsmNodeId> {
        let mut seen = FxHashSet::default();
        let mut junctions = FxHashSet::default();

        for way in ways {
            for node_id in way.nodes() {
                if !seen.insert(*node_id) {
                    junctions.insert(*node_id);
                }
            }
        }

        junctions
    }

    fn node_for(&mut self, osm_node: OsmNodeId) -> NodeId {
        if let Some(node_id) = self.osm_nodes.get(&osm_node) {
            return *node_id;
        }

        let node_id = self.nodes;
        self.nodes += 1;
        self.adjacency_list.push(vec![]);
        self.osm_nodes.insert(osm_node, node_id);
        node_id
    }

    pub fn osm_node(&self, osm_node: OsmNodeId) -> Option<NodeId> {
        self.osm_nodes.get(&osm_node).copied()
    }

    /// Splits the way into edges at junction nodes and adds them to the graph.
    /// Nodes without coordinates are skipped.
    pub fn add_way(
        &mut self,
        way: &Way,
        coordinates: &FxHashMap<OsmNodeId, GeoPoint>,
        junctions: &FxHashSet<OsmNodeId>,
    ) -> Vec<WaySegment> {
        let located: Vec<(OsmNodeId, GeoPoint)> = way
            .nodes()
            .iter()
            .filter_map(|node_id| coordinates.get(node_id).map(|point| (*node_id, *point)))
            .collect();

        if located.len() < way.nodes().len() {
            debug!(
                "Way {} references {} nodes without coordinates",
                way.id(),
                way.nodes().len() - located.len()
            );
        }

        let mut segments = Vec::new();
        let Some((first_node, first_point)) = located.first() else {
            return segments;
        };

        let mut base_osm_node = *first_node;
        let mut geometry = vec![*first_point];

        for (index, (osm_node, point)) in located.iter().enumerate().skip(1) {
            geometry.push(*point);

            let is_last = index == located.len() - 1;
            if !is_last && !junctions.contains(osm_node) {
                continue;
            }

            let edge_geometry = std::mem::replace(&mut geometry, vec![*point]);
            let start_node = self.node_for(base_osm_node);
            let end_node = self.node_for(*osm_node);
            let edge_id = self.add_edge(start_node, end_node, way, edge_geometry);

            segments.push(WaySegment {
                edge_id,
                base_osm_node,
                adj_osm_node: *osm_node,
            });
            base_osm_node = *osm_node;
        }

        segments
    }

    fn add_edge(
        &mut self,
        start_node: NodeId,
        end_node: NodeId,
        way: &Way,
        geometry: Vec<GeoPoint>,
    ) -> EdgeId {
        let edge_id = self.edges.len();
        self.edges.push(GraphEdge::new(
            edge_id,
            start_node,
            end_node,
            compute_geometry_distance(&geometry),
            way.id(),
        ));
        self.geometry.push(geometry);
        self.adjacency_list[start_node].push(edge_id);
        if end_node != start_node {
            self.adjacency_list[end_node].push(edge_id);
        }
        edge_id
    }

    pub fn edge_state(&self, segment: &WaySegment) -> EdgeState<'_> {
        let edge = &self.edges[segment.edge_id];

        EdgeState {
            id: segment.edge_id,
            base_node: edge.start_node(),
            adj_node: edge.end_node(),
            base_osm_node: segment.base_osm_node,
            adj_osm_node: segment.adj_osm_node,
            distance: edge.distance(),
            reversed: false,
            geometry: &self.geometry[segment.edge_id],
        }
    }
}

impl GraphAccess for BaseGraph {
    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn node_count(&self) -> usize {
        self.nodes
    }

    fn edge(&self, edge_id: EdgeId) -> &GraphEdge {
        &self.edges[edge_id]
    }

    fn edge_geometry(&self, edge_id: EdgeId) -> &[GeoPoint] {
        &self.geometry[edge_id]
    }

    fn node_edges(&self, node_id: NodeId) -> &[EdgeId] {
        &self.adjacency_list[node_id]
    }
}
