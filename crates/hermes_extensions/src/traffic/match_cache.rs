use std::path::Path;

use fxhash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::{
    error::ExtensionError,
    graph::GraphAccess,
    storage::impl_file_storage,
    traffic::traffic_link::TravelDirection,
    types::{EdgeId, OsmWayId, TrafficLinkId},
};

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct WayLinksFile {
    entries: Vec<(OsmWayId, Vec<TrafficLinkId>)>,
}

impl_file_storage!(WayLinksFile, "traffic_way_links");

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct LinkEdgesEntry {
    link_id: TrafficLinkId,
    from: Vec<EdgeId>,
    to: Vec<EdgeId>,
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct LinkEdgesFile {
    entries: Vec<LinkEdgesEntry>,
}

impl_file_storage!(LinkEdgesFile, "traffic_link_edges");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkEdges {
    pub from: FxHashSet<EdgeId>,
    pub to: FxHashSet<EdgeId>,
}

impl LinkEdges {
    fn direction(&self, direction: TravelDirection) -> &FxHashSet<EdgeId> {
        match direction {
            TravelDirection::From => &self.from,
            TravelDirection::To => &self.to,
        }
    }

    fn direction_mut(&mut self, direction: TravelDirection) -> &mut FxHashSet<EdgeId> {
        match direction {
            TravelDirection::From => &mut self.from,
            TravelDirection::To => &mut self.to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }
}

/// Results of a previous traffic matching run: which traffic links cover which OSM ways, and which
/// edges every link was matched on.
#[derive(Debug, Default)]
pub struct MatchCache {
    way_links: FxHashMap<OsmWayId, FxHashSet<TrafficLinkId>>,
    link_edges: FxHashMap<TrafficLinkId, LinkEdges>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads whatever part of the cache can be read from `directory`, an unreadable file leaves
    /// that part empty.
    pub fn load(directory: &Path) -> MatchCache {
        let mut cache = MatchCache::new();

        match WayLinksFile::from_file(directory) {
            Ok(file) => {
                cache.way_links = file
                    .entries
                    .into_iter()
                    .map(|(way_id, links)| (way_id, links.into_iter().collect()))
                    .collect();
            }
            Err(error) => warn!("Traffic match cache not used: {}", error),
        }

        match LinkEdgesFile::from_file(directory) {
            Ok(file) => {
                cache.link_edges = file
                    .entries
                    .into_iter()
                    .map(|entry| {
                        let edges = LinkEdges {
                            from: entry.from.into_iter().collect(),
                            to: entry.to.into_iter().collect(),
                        };
                        (entry.link_id, edges)
                    })
                    .collect();
            }
            Err(error) => warn!("Traffic match cache not used: {}", error),
        }

        if !cache.is_empty() {
            info!(
                "Loaded traffic match cache: {} ways, {} links",
                cache.way_links.len(),
                cache.link_edges.len()
            );
        }

        cache
    }

    pub fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        let mut way_links: Vec<(OsmWayId, Vec<TrafficLinkId>)> = self
            .way_links
            .iter()
            .map(|(way_id, links)| {
                let mut links: Vec<TrafficLinkId> = links.iter().copied().collect();
                links.sort_unstable();
                (*way_id, links)
            })
            .collect();
        way_links.sort_unstable_by_key(|(way_id, _)| *way_id);

        let sorted = |edges: &FxHashSet<EdgeId>| {
            let mut edges: Vec<EdgeId> = edges.iter().copied().collect();
            edges.sort_unstable();
            edges
        };
        let mut link_edges: Vec<LinkEdgesEntry> = self
            .link_edges
            .iter()
            .map(|(link_id, edges)| LinkEdgesEntry {
                link_id: *link_id,
                from: sorted(&edges.from),
                to: sorted(&edges.to),
            })
            .collect();
        link_edges.sort_unstable_by_key(|entry| entry.link_id);

        WayLinksFile { entries: way_links }.save_to_file(directory)?;
        LinkEdgesFile {
            entries: link_edges,
        }
        .save_to_file(directory)
    }

    pub fn is_empty(&self) -> bool {
        self.way_links.is_empty() && self.link_edges.is_empty()
    }

    pub fn link_count(&self) -> usize {
        self.link_edges.len()
    }

    /// Registers a link that was processed, matched or not.
    pub fn add_link(&mut self, link_id: TrafficLinkId) {
        self.link_edges.entry(link_id).or_default();
    }

    pub fn record(
        &mut self,
        link_id: TrafficLinkId,
        direction: TravelDirection,
        edge_id: EdgeId,
        way_id: OsmWayId,
    ) {
        self.link_edges
            .entry(link_id)
            .or_default()
            .direction_mut(direction)
            .insert(edge_id);
        self.way_links.entry(way_id).or_default().insert(link_id);
    }

    pub fn link_edges(&self, link_id: TrafficLinkId) -> Option<&LinkEdges> {
        self.link_edges.get(&link_id)
    }

    pub fn way_links(&self, way_id: OsmWayId) -> Option<&FxHashSet<TrafficLinkId>> {
        self.way_links.get(&way_id)
    }

    /// A link processed before without matching any edge.
    pub fn is_removable(&self, link_id: TrafficLinkId) -> bool {
        self.link_edges
            .get(&link_id)
            .is_some_and(|edges| edges.is_empty())
    }

    /// Edges a link direction was matched on before, kept only when the OSM way of the edge is
    /// still known to carry the link. `None` when nothing usable is cached.
    pub fn candidate_edges<G: GraphAccess + ?Sized>(
        &self,
        graph: &G,
        link_id: TrafficLinkId,
        direction: TravelDirection,
    ) -> Option<FxHashSet<EdgeId>> {
        let edges = self.link_edges.get(&link_id)?.direction(direction);

        let candidates: FxHashSet<EdgeId> = edges
            .iter()
            .copied()
            .filter(|edge_id| *edge_id < graph.edge_count())
            .filter(|edge_id| {
                self.way_links(graph.edge(*edge_id).way_id())
                    .is_some_and(|links| links.contains(&link_id))
            })
            .collect();

        (!candidates.is_empty()).then_some(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::straight_line_graph;

    #[test]
    fn test_candidates_follow_the_way_links() {
        let graph = straight_line_graph();
        let way_id = graph.edge(1).way_id();
        let mut cache = MatchCache::new();

        cache.record(7, TravelDirection::From, 1, way_id);
        cache.record(7, TravelDirection::From, 2, way_id + 1);
        cache.record(7, TravelDirection::From, 99, way_id);

        let candidates = cache.candidate_edges(&graph, 7, TravelDirection::From).unwrap();
        assert_eq!(candidates.into_iter().collect::<Vec<_>>(), vec![1]);
        assert!(cache.candidate_edges(&graph, 7, TravelDirection::To).is_none());
        assert!(cache.candidate_edges(&graph, 8, TravelDirection::From).is_none());
    }

    #[test]
    fn test_unmatched_links_are_removable() {
        let mut cache = MatchCache::new();
        cache.add_link(3);
        cache.record(4, TravelDirection::To, 0, 100);

        assert!(cache.is_removable(3));
        assert!(!cache.is_removable(4));
        assert!(!cache.is_removable(5));
    }

    #[test]
    fn test_cache_survives_a_round_trip_on_disk() {
        let directory = std::env::temp_dir().join("hermes_extensions_match_cache");
        std::fs::create_dir_all(&directory).unwrap();

        let mut cache = MatchCache::new();
        cache.record(4, TravelDirection::To, 2, 100);
        cache.record(4, TravelDirection::From, 3, 100);
        cache.add_link(5);
        cache.save(&directory).unwrap();

        let loaded = MatchCache::load(&directory);
        assert_eq!(loaded.link_count(), 2);
        assert_eq!(loaded.link_edges(4), cache.link_edges(4));
        assert!(loaded.way_links(100).unwrap().contains(&4));
        assert!(loaded.is_removable(5));
    }

    #[test]
    fn test_missing_cache_is_empty() {
        let directory = std::env::temp_dir().join("hermes_extensions_no_match_cache");
        std::fs::create_dir_all(&directory).unwrap();

        assert!(MatchCache::load(&directory).is_empty());
    }
}
