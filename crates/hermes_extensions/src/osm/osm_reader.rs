use std::{fs::File, path::Path};

use fxhash::FxHashMap;
use osmpbfreader::{OsmObj, OsmPbfReader};
use tracing::{debug, info};

use crate::{
    error::ExtensionError,
    geopoint::GeoPoint,
    osm::{tag_resolver::normalize_tags, way::Way},
    types::OsmNodeId,
};

#[derive(Default)]
pub struct OsmData {
    ways: Vec<Way>,
    coordinates: FxHashMap<OsmNodeId, GeoPoint>,
}

impl OsmData {
    pub fn new(ways: Vec<Way>, coordinates: FxHashMap<OsmNodeId, GeoPoint>) -> Self {
        OsmData { ways, coordinates }
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn coordinates(&self) -> &FxHashMap<OsmNodeId, GeoPoint> {
        &self.coordinates
    }
}

fn accept_way(way: &osmpbfreader::Way) -> bool {
    if way.nodes.len() < 2 {
        return false;
    }

    way.tags.contains_key("highway")
        || way
            .tags
            .get("route")
            .is_some_and(|route| matches!(route.as_str(), "ferry" | "shuttle_train"))
}

/// Reads the routable ways of a PBF file together with the nodes they reference.
pub fn parse_osm_file(path: &Path) -> Result<OsmData, ExtensionError> {
    info!("Reading OSM data from {}", path.display());

    let file = File::open(path).map_err(|source| ExtensionError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = OsmPbfReader::new(file);

    let objects = reader.get_objs_and_deps(|obj| match obj {
        OsmObj::Way(way) => accept_way(way),
        _ => false,
    })?;

    let mut coordinates = FxHashMap::default();
    let mut node_tags = FxHashMap::default();

    for obj in objects.values() {
        if let OsmObj::Node(node) = obj {
            coordinates.insert(node.id.0, GeoPoint::new(node.lon(), node.lat()));

            if !node.tags.is_empty() {
                let tags = normalize_tags(
                    node.tags
                        .iter()
                        .map(|(key, value)| (key.as_str(), value.as_str())),
                );
                node_tags.insert(node.id.0, tags);
            }
        }
    }

    let mut ways = Vec::new();

    for obj in objects.values() {
        if let OsmObj::Way(osm_way) = obj {
            let nodes: Vec<OsmNodeId> = osm_way.nodes.iter().map(|node| node.0).collect();
            let mut way = Way::new(
                osm_way.id.0,
                osm_way
                    .tags
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
                nodes,
            );

            for node_id in osm_way.nodes.iter().map(|node| node.0) {
                if let Some(tags) = node_tags.get(&node_id) {
                    way.set_node_tags(node_id, tags.clone());
                }
            }

            ways.push(way);

            if ways.len() % 100_000 == 0 {
                debug!("Processed {} ways", ways.len());
            }
        }
    }

    info!(
        "Found {} ways and {} nodes",
        ways.len(),
        coordinates.len()
    );

    Ok(OsmData::new(ways, coordinates))
}
