use std::path::PathBuf;

use fxhash::{FxHashMap, FxHashSet};

use crate::{
    base_graph::BaseGraph, geopoint::GeoPoint, graph_edge::EdgeState, osm::way::Way,
    types::EdgeId,
};

fn test_directory() -> PathBuf {
    let directory = std::env::temp_dir().join("hermes_extensions_tests");
    std::fs::create_dir_all(&directory).unwrap();
    directory
}

/// One secondary road running east along latitude 50, cut at its two inner nodes into three
/// edges of about 71.5 meters.
pub fn straight_line_graph() -> BaseGraph {
    let way = Way::new(1, [("highway", "secondary")], vec![1, 2, 3, 4]);
    let coordinates: FxHashMap<i64, GeoPoint> = [
        (1, GeoPoint::new(4.0, 50.0)),
        (2, GeoPoint::new(4.001, 50.0)),
        (3, GeoPoint::new(4.002, 50.0)),
        (4, GeoPoint::new(4.003, 50.0)),
    ]
    .into_iter()
    .collect();
    let junctions: FxHashSet<i64> = [2, 3].into_iter().collect();

    let mut graph = BaseGraph::new();
    graph.add_way(&way, &coordinates, &junctions);
    graph
}

/// Edge state without geometry for builders that only look at the edge id.
pub fn edge_state(id: EdgeId) -> EdgeState<'static> {
    EdgeState {
        id,
        base_node: 0,
        adj_node: 1,
        base_osm_node: 1,
        adj_osm_node: 2,
        distance: 10.0,
        reversed: false,
        geometry: &[],
    }
}

pub fn empty_context() -> (BaseGraph, PathBuf) {
    let output = test_directory().join("output");
    std::fs::create_dir_all(&output).unwrap();
    (BaseGraph::new(), output)
}

pub fn write_temp_file(name: &str, contents: &str) -> PathBuf {
    let path = test_directory().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
