use fxhash::FxHashSet;
use tracing::debug;

use crate::{
    geometry::{compute_geometry_distance, fraction_along, midpoint, project_point},
    geopoint::GeoPoint,
    graph::GraphAccess,
    location_index::EdgeIndex,
    query_graph::QueryGraph,
    snap::Snap,
    traffic::{
        road_type::FunctionalClass,
        traffic_storage::TrafficStore,
        virtual_edge::{ResolvedEdge, resolve_virtual_edge},
    },
    types::EdgeId,
};

/// Search radii in meters, tried in turn up to the configured radius.
const RADIUS_STEPS: [f64; 4] = [20.0, 50.0, 100.0, 200.0];

const MAX_CANDIDATES: usize = 10;

/// A match longer than this many times the link is rejected.
const MAX_LENGTH_RATIO: f64 = 1.8;

/// Largest overlap in meters between the link stretches covered by two matched edges
const MAX_OVERLAP_METERS: f64 = 1.0;

/// Share of the priority given to closeness, the rest comes from the pattern coverage.
const CLOSENESS_PRIORITY: f64 = 159.0;

pub const DEFAULT_MATCHING_RADIUS: f64 = 200.0;

/// An edge traversal matched onto a traffic link geometry.
#[derive(Debug, Clone)]
pub struct MatchedEdge {
    pub edge: ResolvedEdge,
    /// Mean distance in meters between the matched piece and the link
    pub distance: f64,
    pub length: f64,
    pub geometry: Vec<GeoPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct GeometryMatch {
    pub edges: Vec<MatchedEdge>,
    pub functional_class: Option<FunctionalClass>,
    /// Matched in another functional class than the one of the link
    pub fallback: bool,
}

impl GeometryMatch {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

pub fn radius_steps(radius: f64) -> Vec<f64> {
    let mut steps: Vec<f64> = RADIUS_STEPS
        .iter()
        .copied()
        .filter(|step| *step < radius)
        .collect();
    steps.push(radius);
    steps
}

/// Priority of a match: closer matches and patterns with data for more of the day win.
pub fn match_priority(distance: f64, radius: f64, non_zero_buckets: usize) -> u32 {
    let closeness = if radius > 0.0 {
        (1.0 - distance / radius).clamp(0.0, 1.0)
    } else {
        0.0
    };

    // at most 159 + 96
    let priority = (closeness * CLOSENESS_PRIORITY).round() as u32 + non_zero_buckets as u32;
    priority.min(u32::from(u8::MAX))
}

pub fn is_plausible_length(matched_length: f64, link_length: f64) -> bool {
    matched_length <= link_length * MAX_LENGTH_RATIO
}

/// Matches traffic link geometries onto the edges of a graph.
pub struct LinkMatcher<'a> {
    graph: &'a (dyn GraphAccess + Sync),
    index: &'a EdgeIndex,
    store: &'a TrafficStore,
    radius: f64,
}

struct Candidate {
    edge_id: EdgeId,
    distance: f64,
}

struct Piece {
    matched: MatchedEdge,
    start_fraction: f64,
    end_fraction: f64,
}

impl Piece {
    fn covered(&self) -> (f64, f64) {
        (
            self.start_fraction.min(self.end_fraction),
            self.start_fraction.max(self.end_fraction),
        )
    }
}

fn mean_distance(points: &[GeoPoint], link: &[GeoPoint]) -> f64 {
    let distances: Vec<f64> = points
        .iter()
        .filter_map(|point| project_point(link, point).map(|projection| projection.distance))
        .collect();

    if distances.is_empty() {
        f64::MAX
    } else {
        distances.iter().sum::<f64>() / distances.len() as f64
    }
}

impl<'a> LinkMatcher<'a> {
    pub fn new(
        graph: &'a (dyn GraphAccess + Sync),
        index: &'a EdgeIndex,
        store: &'a TrafficStore,
        radius: f64,
    ) -> Self {
        LinkMatcher {
            graph,
            index,
            store,
            radius,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Matches the geometry in its functional class first, then in the fallback classes.
    /// `allowed` restricts the candidates to known edges when set.
    pub fn match_link_geometry(
        &self,
        geometry: &[GeoPoint],
        functional_class: FunctionalClass,
        ramp: bool,
        allowed: Option<&FxHashSet<EdgeId>>,
    ) -> GeometryMatch {
        if geometry.len() < 2 {
            return GeometryMatch::default();
        }

        let link_length = compute_geometry_distance(geometry);

        for class in functional_class.fallback_sequence() {
            let edges = self.match_in_class(geometry, link_length, class, ramp, allowed);
            if !edges.is_empty() {
                return GeometryMatch {
                    edges,
                    functional_class: Some(class),
                    fallback: class != functional_class,
                };
            }
        }

        GeometryMatch::default()
    }

    fn match_in_class(
        &self,
        geometry: &[GeoPoint],
        link_length: f64,
        class: FunctionalClass,
        ramp: bool,
        allowed: Option<&FxHashSet<EdgeId>>,
    ) -> Vec<MatchedEdge> {
        for step in radius_steps(self.radius) {
            let candidates = self.candidates(geometry, step, class, ramp, allowed);
            if candidates.is_empty() {
                continue;
            }

            let edges = self.match_candidates(geometry, link_length, step, &candidates);
            if edges.is_empty() {
                continue;
            }

            let matched_length: f64 = edges.iter().map(|edge| edge.length).sum();
            if !is_plausible_length(matched_length, link_length) {
                debug!(
                    "Rejected match of {:.1} m for a link of {:.1} m",
                    matched_length, link_length
                );
                return vec![];
            }

            return edges;
        }

        vec![]
    }

    fn candidates(
        &self,
        geometry: &[GeoPoint],
        radius: f64,
        class: FunctionalClass,
        ramp: bool,
        allowed: Option<&FxHashSet<EdgeId>>,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .index
            .edges_near(geometry, radius)
            .into_iter()
            .filter(|edge_id| allowed.is_none_or(|allowed| allowed.contains(edge_id)))
            .filter(|edge_id| class.accepts(self.store.road_type(*edge_id), ramp))
            .map(|edge_id| Candidate {
                edge_id,
                distance: mean_distance(self.graph.edge_geometry(edge_id), geometry),
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.edge_id.cmp(&b.edge_id))
        });
        candidates.truncate(MAX_CANDIDATES);
        candidates
    }

    /// Closest candidate projection of `point` within `radius`.
    fn snap(&self, point: &GeoPoint, radius: f64, candidates: &[Candidate]) -> Option<Snap> {
        candidates
            .iter()
            .filter_map(|candidate| {
                project_point(self.graph.edge_geometry(candidate.edge_id), point)
                    .map(|projection| Snap::new(candidate.edge_id, projection.point, projection.distance))
            })
            .filter(|snap| snap.distance <= radius)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn match_candidates(
        &self,
        geometry: &[GeoPoint],
        link_length: f64,
        radius: f64,
        candidates: &[Candidate],
    ) -> Vec<MatchedEdge> {
        let (Some(first), Some(last)) = (geometry.first(), geometry.last()) else {
            return vec![];
        };

        let snaps: Vec<Snap> = [first, last]
            .into_iter()
            .filter_map(|point| self.snap(point, radius, candidates))
            .collect();
        let query_graph = QueryGraph::from_base_graph(self.graph, &snaps);

        let mut pieces: Vec<Piece> = candidates
            .iter()
            .flat_map(|candidate| query_graph.edge_pieces(candidate.edge_id))
            .filter_map(|piece_id| self.piece(&query_graph, piece_id, geometry, radius))
            .collect();

        pieces.sort_by(|a, b| a.matched.distance.total_cmp(&b.matched.distance));

        // closest first, each stretch of the link is covered once
        let mut accepted: Vec<Piece> = Vec::new();
        for piece in pieces {
            let (start, end) = piece.covered();
            let overlaps = accepted.iter().any(|other| {
                let (other_start, other_end) = other.covered();
                let overlap = end.min(other_end) - start.max(other_start);
                overlap * link_length > MAX_OVERLAP_METERS
            });

            if !overlaps {
                accepted.push(piece);
            }
        }

        accepted.sort_by(|a, b| a.covered().0.total_cmp(&b.covered().0));
        accepted.into_iter().map(|piece| piece.matched).collect()
    }

    fn piece<G: GraphAccess + ?Sized>(
        &self,
        query_graph: &QueryGraph<G>,
        piece_id: EdgeId,
        link: &[GeoPoint],
        radius: f64,
    ) -> Option<Piece> {
        let piece_geometry = query_graph.edge_geometry(piece_id);
        let center = midpoint(piece_geometry)?;

        let center_fraction = fraction_along(link, &center)?;
        if center_fraction <= 0.0 || center_fraction >= 1.0 {
            return None;
        }

        let center_distance = project_point(link, &center)?.distance;
        if center_distance > radius {
            return None;
        }

        let start_fraction = fraction_along(link, piece_geometry.first()?)?;
        let end_fraction = fraction_along(link, piece_geometry.last()?)?;

        let piece = query_graph.edge(piece_id);
        let (base_node, adj_node) = if start_fraction <= end_fraction {
            (piece.start_node(), piece.end_node())
        } else {
            (piece.end_node(), piece.start_node())
        };
        let edge = resolve_virtual_edge(query_graph, piece_id, base_node, adj_node)?;

        let mut samples = piece_geometry.to_vec();
        samples.push(center);

        Some(Piece {
            matched: MatchedEdge {
                edge,
                distance: mean_distance(&samples, link),
                length: piece.distance(),
                geometry: piece_geometry.to_vec(),
            },
            start_fraction,
            end_fraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{base_graph::BaseGraph, traffic::road_type::RoadType, test_utils::straight_line_graph};

    fn store_with(graph: &BaseGraph, road_type: RoadType) -> TrafficStore {
        let mut store = TrafficStore::new("UTC");
        for edge_id in 0..graph.edge_count() {
            store.set_road_type(edge_id, road_type);
        }
        store
    }

    fn link_geometry() -> Vec<GeoPoint> {
        vec![GeoPoint::new(4.0005, 50.00005), GeoPoint::new(4.0025, 50.00005)]
    }

    #[test]
    fn test_radius_steps() {
        assert_eq!(radius_steps(200.0), vec![20.0, 50.0, 100.0, 200.0]);
        assert_eq!(radius_steps(60.0), vec![20.0, 50.0, 60.0]);
        assert_eq!(radius_steps(10.0), vec![10.0]);
    }

    #[test]
    fn test_priority() {
        assert_eq!(match_priority(0.0, 200.0, 96), 255);
        assert_eq!(match_priority(100.0, 200.0, 0), 80);
        assert_eq!(match_priority(500.0, 200.0, 10), 10);
    }

    #[test]
    fn test_length_validation() {
        assert!(is_plausible_length(170.0, 100.0));
        assert!(!is_plausible_length(190.0, 100.0));
    }

    #[test]
    fn test_link_is_matched_on_cut_edges() {
        let graph = straight_line_graph();
        let index = EdgeIndex::build_from_graph(&graph);
        let store = store_with(&graph, RoadType::Secondary);
        let matcher = LinkMatcher::new(&graph, &index, &store, DEFAULT_MATCHING_RADIUS);

        let result = matcher.match_link_geometry(&link_geometry(), FunctionalClass::Class3, false, None);

        assert!(!result.fallback);
        assert_eq!(result.functional_class, Some(FunctionalClass::Class3));
        let edges: Vec<EdgeId> = result.edges.iter().map(|edge| edge.edge.edge_id).collect();
        assert_eq!(edges, vec![0, 1, 2]);

        for matched in &result.edges {
            let edge = graph.edge(matched.edge.edge_id);
            assert_eq!(matched.edge.base_node, edge.start_node());
            assert_eq!(matched.edge.adj_node, edge.end_node());
            assert!((matched.distance - 5.56).abs() < 0.1, "{}", matched.distance);
        }

        let matched_length: f64 = result.edges.iter().map(|edge| edge.length).sum();
        assert!((matched_length - compute_geometry_distance(&link_geometry())).abs() < 1.0);
    }

    #[test]
    fn test_reversed_geometry_matches_backward() {
        let graph = straight_line_graph();
        let index = EdgeIndex::build_from_graph(&graph);
        let store = store_with(&graph, RoadType::Secondary);
        let matcher = LinkMatcher::new(&graph, &index, &store, DEFAULT_MATCHING_RADIUS);

        let reversed: Vec<GeoPoint> = link_geometry().into_iter().rev().collect();
        let result = matcher.match_link_geometry(&reversed, FunctionalClass::Class3, false, None);

        let edges: Vec<EdgeId> = result.edges.iter().map(|edge| edge.edge.edge_id).collect();
        assert_eq!(edges, vec![2, 1, 0]);
        for matched in &result.edges {
            let edge = graph.edge(matched.edge.edge_id);
            assert_eq!(matched.edge.base_node, edge.end_node());
        }
    }

    #[test]
    fn test_fallback_class_is_reported() {
        let graph = straight_line_graph();
        let index = EdgeIndex::build_from_graph(&graph);
        let store = store_with(&graph, RoadType::Primary);
        let matcher = LinkMatcher::new(&graph, &index, &store, DEFAULT_MATCHING_RADIUS);

        let result = matcher.match_link_geometry(&link_geometry(), FunctionalClass::Class3, false, None);
        assert!(result.fallback);
        assert_eq!(result.functional_class, Some(FunctionalClass::Class2));

        let unrelated = matcher.match_link_geometry(&link_geometry(), FunctionalClass::Class5, false, None);
        assert!(unrelated.is_empty());
    }

    #[test]
    fn test_allowed_edges_restrict_candidates() {
        let graph = straight_line_graph();
        let index = EdgeIndex::build_from_graph(&graph);
        let store = store_with(&graph, RoadType::Secondary);
        let matcher = LinkMatcher::new(&graph, &index, &store, DEFAULT_MATCHING_RADIUS);
        let allowed: FxHashSet<EdgeId> = [1].into_iter().collect();

        let result =
            matcher.match_link_geometry(&link_geometry(), FunctionalClass::Class3, false, Some(&allowed));

        let edges: Vec<EdgeId> = result.edges.iter().map(|edge| edge.edge.edge_id).collect();
        assert_eq!(edges, vec![1]);
    }

    #[test]
    fn test_distant_link_is_not_matched() {
        let graph = straight_line_graph();
        let index = EdgeIndex::build_from_graph(&graph);
        let store = store_with(&graph, RoadType::Secondary);
        let matcher = LinkMatcher::new(&graph, &index, &store, DEFAULT_MATCHING_RADIUS);

        let far = vec![GeoPoint::new(4.0005, 50.01), GeoPoint::new(4.0025, 50.01)];
        assert!(
            matcher
                .match_link_geometry(&far, FunctionalClass::Class3, false, None)
                .is_empty()
        );
        assert!(
            matcher
                .match_link_geometry(&far[..1], FunctionalClass::Class3, false, None)
                .is_empty()
        );
    }
}
