use fxhash::FxHashSet;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};
use tracing::info;

use crate::{
    geometry::expanded_envelope, geopoint::GeoPoint, graph::GraphAccess, types::EdgeId,
};

struct IndexedLine(geo::Line);

impl IndexedLine {
    fn new(start: &GeoPoint, end: &GeoPoint) -> Self {
        IndexedLine(geo::Line::new(start, end))
    }

    fn line(&self) -> &geo::Line {
        &self.0
    }
}

impl RTreeObject for IndexedLine {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let line = self.line();
        AABB::from_corners([line.start.x, line.start.y], [line.end.x, line.end.y])
    }
}

type EdgeIndexObject = GeomWithData<IndexedLine, EdgeId>;

struct EdgeIndexTreeParams;

impl RTreeParams for EdgeIndexTreeParams {
    type DefaultInsertionStrategy = RStarInsertionStrategy;

    const MAX_SIZE: usize = 64;
    const MIN_SIZE: usize = 28;
    const REINSERTION_COUNT: usize = 5;
}

/// Spatial index over the segments of every edge of a graph.
pub struct EdgeIndex {
    tree: RTree<EdgeIndexObject, EdgeIndexTreeParams>,
}

impl EdgeIndex {
    pub fn build_from_graph<G: GraphAccess + ?Sized>(graph: &G) -> EdgeIndex {
        info!("Building edge index");

        let tree: RTree<EdgeIndexObject, EdgeIndexTreeParams> = RTree::bulk_load_with_params(
            (0..graph.edge_count())
                .flat_map(|edge_id| {
                    graph.edge_geometry(edge_id).windows(2).map(move |segment| {
                        EdgeIndexObject::new(IndexedLine::new(&segment[0], &segment[1]), edge_id)
                    })
                })
                .collect(),
        );

        info!("Finished building edge index, {} segments", tree.size());

        EdgeIndex { tree }
    }

    /// Edges with a segment inside the bounding box of `geometry` grown by `radius` meters,
    /// sorted by id.
    pub fn edges_near(&self, geometry: &[GeoPoint], radius: f64) -> Vec<EdgeId> {
        if geometry.is_empty() {
            return vec![];
        }

        let (min, max) = expanded_envelope(geometry, radius);
        let envelope = AABB::from_corners(min, max);

        let edges: FxHashSet<EdgeId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|object| object.data)
            .collect();

        let mut edges: Vec<EdgeId> = edges.into_iter().collect();
        edges.sort_unstable();
        edges
    }
}
