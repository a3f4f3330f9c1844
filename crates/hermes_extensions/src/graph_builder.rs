use std::path::Path;

use tracing::info;

use crate::{
    base_graph::{BaseGraph, WaySegment},
    builders::{graph_storage_builder::GraphContext, registry::GraphStorageBuilderRegistry},
    error::ExtensionError,
    graph::GraphAccess,
    graph_edge::EdgeState,
    osm::osm_reader::OsmData,
};

/// Builds the base graph from the ways and runs every registered builder over it: way and edge
/// phases way by way, then `finish`, `post_process` and `save` into `output_dir`.
pub fn build_graph(
    osm: &OsmData,
    registry: &mut GraphStorageBuilderRegistry,
    output_dir: &Path,
) -> Result<BaseGraph, ExtensionError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ExtensionError::Write {
        path: output_dir.display().to_string(),
        source,
    })?;

    let junctions = BaseGraph::junction_nodes(osm.ways());
    let mut graph = BaseGraph::new();

    let way_segments: Vec<Vec<WaySegment>> = osm
        .ways()
        .iter()
        .map(|way| graph.add_way(way, osm.coordinates(), &junctions))
        .collect();

    info!(
        "Graph built with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let context = GraphContext::new(&graph, output_dir);
    registry.init(&context)?;

    for (way, segments) in osm.ways().iter().zip(&way_segments) {
        if segments.is_empty() {
            continue;
        }

        let edges: Vec<EdgeState> = segments
            .iter()
            .map(|segment| graph.edge_state(segment))
            .collect();
        registry.process_way_edges(way, &edges);
    }

    registry.finish()?;
    registry.post_process(&context)?;
    registry.save(output_dir)?;

    info!("Saved {} extension stores", registry.len());

    Ok(graph)
}
