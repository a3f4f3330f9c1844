use std::path::Path;

use crate::{
    builders::graph_storage_builder::{GraphContext, GraphStorageBuilder},
    config::BuilderConfig,
    error::ExtensionError,
    extension_store::EdgeValueStore,
    graph_edge::EdgeState,
    osm::{tag_resolver::Tags, way::Way},
    storage::impl_file_storage,
    types::EdgeId,
};

const PLAIN_CROSSINGS: [&str; 5] = ["uncontrolled", "zebra", "island", "marked", "unmarked"];

/// Largest count stored, one below the unknown sentinel
const MAX_COUNT: u8 = u8::MAX - 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossingCounts {
    pub traffic_signals: u8,
    pub crossings: u8,
}

fn is_traffic_signal(tags: &Tags) -> bool {
    tags.get("highway").is_some_and(|value| value == "traffic_signals")
        || tags.get("crossing").is_some_and(|value| value == "traffic_signals")
}

fn is_plain_crossing(tags: &Tags) -> bool {
    tags.get("highway").is_some_and(|value| value == "crossing")
        || tags
            .get("crossing")
            .is_some_and(|value| PLAIN_CROSSINGS.contains(&value.as_str()))
}

pub fn count_crossings(way: &Way) -> CrossingCounts {
    let mut counts = CrossingCounts::default();

    for (_, tags) in way.node_tags_iter() {
        if is_traffic_signal(tags) {
            counts.traffic_signals = counts.traffic_signals.saturating_add(1).min(MAX_COUNT);
        } else if is_plain_crossing(tags) {
            counts.crossings = counts.crossings.saturating_add(1).min(MAX_COUNT);
        }
    }

    counts
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct StreetCrossingStore {
    traffic_signals: EdgeValueStore<u8>,
    crossings: EdgeValueStore<u8>,
}

impl_file_storage!(StreetCrossingStore, "street_crossing");

impl StreetCrossingStore {
    pub fn new() -> Self {
        StreetCrossingStore {
            traffic_signals: EdgeValueStore::new(u8::MAX),
            crossings: EdgeValueStore::new(u8::MAX),
        }
    }

    pub fn counts(&self, edge_id: EdgeId) -> Option<CrossingCounts> {
        Some(CrossingCounts {
            traffic_signals: self.traffic_signals.get(edge_id)?,
            crossings: self.crossings.get(edge_id)?,
        })
    }
}

impl Default for StreetCrossingStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StreetCrossingBuilder {
    store: Option<StreetCrossingStore>,
}

impl StreetCrossingBuilder {
    pub const NAME: &'static str = "StreetCrossing";

    pub fn new(_config: BuilderConfig) -> Self {
        StreetCrossingBuilder { store: None }
    }

    pub fn store(&self) -> Option<&StreetCrossingStore> {
        self.store.as_ref()
    }
}

impl GraphStorageBuilder for StreetCrossingBuilder {
    type Decision = CrossingCounts;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(Self::NAME));
        }
        self.store = Some(StreetCrossingStore::new());
        Ok(())
    }

    fn process_way(&self, way: &Way) -> CrossingCounts {
        count_crossings(way)
    }

    fn process_edge(&mut self, _way: &Way, counts: &CrossingCounts, edge: &EdgeState) {
        if let Some(store) = self.store.as_mut() {
            store.traffic_signals.set(edge.id, counts.traffic_signals);
            store.crossings.set(edge.id, counts.crossings);
        }
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        self.store
            .as_ref()
            .ok_or(ExtensionError::NotInitialized(Self::NAME))?
            .save_to_file(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_and_plain_crossings_are_counted_apart() {
        let way = Way::new(1, [("highway", "secondary")], vec![1, 2, 3, 4, 5])
            .with_node_tags(1, [("highway", "traffic_signals")])
            .with_node_tags(2, [("highway", "crossing"), ("crossing", "traffic_signals")])
            .with_node_tags(3, [("highway", "crossing"), ("crossing", "zebra")])
            .with_node_tags(4, [("crossing", "island")])
            .with_node_tags(5, [("barrier", "bollard")]);

        assert_eq!(
            count_crossings(&way),
            CrossingCounts {
                traffic_signals: 2,
                crossings: 2
            }
        );
    }

    #[test]
    fn test_way_without_crossings() {
        let way = Way::new(1, [("highway", "residential")], vec![1, 2]);
        assert_eq!(count_crossings(&way), CrossingCounts::default());
    }
}
