use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    builders::graph_storage_builder::{GraphContext, GraphStorageBuilder},
    config::BuilderConfig,
    error::ExtensionError,
    geopoint::GeoPoint,
    graph::GraphAccess,
    graph_edge::EdgeState,
    location_index::EdgeIndex,
    osm::way::Way,
    storage::write_bytes,
    traffic::{
        link_matcher::{DEFAULT_MATCHING_RADIUS, GeometryMatch, LinkMatcher, match_priority},
        match_cache::MatchCache,
        road_type::RoadType,
        traffic_link::{TrafficLink, TravelDirection, WeeklyPatterns},
        traffic_reader::{TrafficData, read_traffic_data},
        traffic_storage::{DEFAULT_TIME_ZONE, TrafficStore},
    },
    types::{EdgeId, TrafficLinkId},
};

#[derive(Debug, Clone)]
struct TrafficSettings {
    enabled: bool,
    streets: PathBuf,
    patterns: PathBuf,
    reference_patterns: PathBuf,
    radius: f64,
    output_log: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    time_zone: String,
}

impl TrafficSettings {
    fn from_config(config: &BuilderConfig) -> Result<Self, ExtensionError> {
        let name = HereTrafficBuilder::NAME;
        let enabled = config.bool_or("enabled", true);

        // the data files are only needed when matching runs
        let path = |key: &str| -> Result<PathBuf, ExtensionError> {
            if enabled {
                config.required(name, key).map(PathBuf::from)
            } else {
                Ok(config.get(key).map(PathBuf::from).unwrap_or_default())
            }
        };

        Ok(TrafficSettings {
            enabled,
            streets: path("streets")?,
            patterns: path("pattern_15min")?,
            reference_patterns: path("ref_pattern")?,
            radius: config.parse_or(name, "radius", DEFAULT_MATCHING_RADIUS)?,
            output_log: config.get("output_log").map(PathBuf::from),
            cache_dir: config.get("cache_dir").map(PathBuf::from),
            time_zone: config
                .get("timezone")
                .unwrap_or(DEFAULT_TIME_ZONE)
                .to_string(),
        })
    }
}

/// Counters of one matching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStatistics {
    /// Edge directions that received a pattern
    pub processed_edges: usize,
    /// Link directions matched in their own functional class
    pub high_confidence: usize,
    /// Link directions matched in a fallback class
    pub low_confidence: usize,
    pub unmatched: usize,
    /// Links without geometry or patterns, or known from the cache to match nothing
    pub removable: usize,
}

struct DirectionMatch {
    direction: TravelDirection,
    patterns: WeeklyPatterns,
    result: GeometryMatch,
}

struct LinkMatch {
    link_id: TrafficLinkId,
    removable: bool,
    directions: Vec<DirectionMatch>,
}

impl LinkMatch {
    fn is_unmatched(&self) -> bool {
        self.directions
            .iter()
            .all(|direction| direction.result.is_empty())
    }
}

fn match_link(
    matcher: &LinkMatcher,
    graph: &(dyn GraphAccess + Sync),
    cache: &MatchCache,
    link: &TrafficLink,
) -> LinkMatch {
    let mut link_match = LinkMatch {
        link_id: link.id(),
        removable: false,
        directions: vec![],
    };

    if !link.is_potential_traffic_segment() || cache.is_removable(link.id()) {
        debug!("Traffic link {} skipped", link.id());
        link_match.removable = true;
        return link_match;
    }

    for direction in link.matchable_directions() {
        let Some(patterns) = link.patterns(direction).copied() else {
            continue;
        };

        let geometry = link.directional_geometry(direction);
        let allowed = cache.candidate_edges(graph, link.id(), direction);

        let mut result = matcher.match_link_geometry(
            &geometry,
            link.functional_class(),
            link.is_ramp(),
            allowed.as_ref(),
        );

        // cached edges may be stale
        if result.is_empty() && allowed.is_some() {
            result = matcher.match_link_geometry(
                &geometry,
                link.functional_class(),
                link.is_ramp(),
                None,
            );
        }

        link_match.directions.push(DirectionMatch {
            direction,
            patterns,
            result,
        });
    }

    link_match
}

fn log_feature(
    link_id: TrafficLinkId,
    direction: TravelDirection,
    edge_id: EdgeId,
    priority: u32,
    geometry: &[GeoPoint],
) -> Feature {
    let coordinates: Vec<Vec<f64>> = geometry
        .iter()
        .map(|point| vec![point.lon(), point.lat()])
        .collect();

    let mut properties = JsonObject::new();
    properties.insert("link_id".to_string(), link_id.into());
    properties.insert(
        "direction".to_string(),
        match direction {
            TravelDirection::From => "F",
            TravelDirection::To => "T",
        }
        .into(),
    );
    properties.insert("edge_id".to_string(), edge_id.into());
    properties.insert("priority".to_string(), priority.into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn write_match_log(path: &Path, features: Vec<Feature>) -> Result<(), ExtensionError> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let json = serde_json::to_string(&collection)
        .map_err(|_| ExtensionError::Serialize(path.display().to_string()))?;
    write_bytes(json.as_bytes(), path)?;
    info!("Wrote traffic match log to {}", path.display());
    Ok(())
}

/// Matches HERE traffic links onto the graph and stores their weekly speed patterns per edge
/// direction.
pub struct HereTrafficBuilder {
    config: BuilderConfig,
    settings: Option<TrafficSettings>,
    store: Option<TrafficStore>,
    statistics: MatchStatistics,
}

impl HereTrafficBuilder {
    pub const NAME: &'static str = "HereTraffic";

    pub fn new(config: BuilderConfig) -> Self {
        HereTrafficBuilder {
            config,
            settings: None,
            store: None,
            statistics: MatchStatistics::default(),
        }
    }

    pub fn store(&self) -> Option<&TrafficStore> {
        self.store.as_ref()
    }

    pub fn statistics(&self) -> MatchStatistics {
        self.statistics
    }

    fn apply_matches(
        store: &mut TrafficStore,
        graph: &(dyn GraphAccess + Sync),
        data: &TrafficData,
        matches: Vec<LinkMatch>,
        radius: f64,
        cache: &mut MatchCache,
        mut log: Option<&mut Vec<Feature>>,
    ) -> MatchStatistics {
        let mut statistics = MatchStatistics::default();

        for link_match in matches {
            cache.add_link(link_match.link_id);

            if link_match.removable {
                statistics.removable += 1;
                continue;
            }
            if link_match.is_unmatched() {
                statistics.unmatched += 1;
            }

            for direction in &link_match.directions {
                if direction.result.is_empty() {
                    continue;
                }
                if direction.result.fallback {
                    statistics.low_confidence += 1;
                } else {
                    statistics.high_confidence += 1;
                }

                let non_zero_buckets = direction
                    .patterns
                    .iter()
                    .filter_map(|pattern_id| data.pattern(*pattern_id))
                    .map(|pattern| pattern.non_zero_buckets())
                    .max()
                    .unwrap_or(0);

                for matched in &direction.result.edges {
                    let edge = matched.edge;
                    let priority = match_priority(matched.distance, radius, non_zero_buckets);

                    let mut written = false;
                    for (weekday, pattern_id) in direction.patterns.iter().enumerate() {
                        written |= store.set_edge_pattern(
                            edge.edge_id,
                            edge.base_node,
                            edge.adj_node,
                            weekday,
                            *pattern_id,
                            priority,
                        );
                    }
                    if written {
                        statistics.processed_edges += 1;
                    }

                    cache.record(
                        link_match.link_id,
                        direction.direction,
                        edge.edge_id,
                        graph.edge(edge.edge_id).way_id(),
                    );

                    if let Some(features) = log.as_deref_mut() {
                        features.push(log_feature(
                            link_match.link_id,
                            direction.direction,
                            edge.edge_id,
                            priority,
                            &matched.geometry,
                        ));
                    }
                }
            }
        }

        statistics
    }
}

impl GraphStorageBuilder for HereTrafficBuilder {
    type Decision = RoadType;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, context: &GraphContext) -> Result<(), ExtensionError> {
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(Self::NAME));
        }

        let settings = TrafficSettings::from_config(&self.config)?;

        let store = match TrafficStore::from_file(context.output_dir) {
            Ok(store) if store.is_matched() => {
                info!("Found matched traffic data in {}", context.output_dir.display());
                store
            }
            _ => TrafficStore::new(&settings.time_zone),
        };

        self.settings = Some(settings);
        self.store = Some(store);
        Ok(())
    }

    fn process_way(&self, way: &Way) -> RoadType {
        way.tag("highway").map_or(RoadType::Ignore, RoadType::from_highway)
    }

    fn process_edge(&mut self, _way: &Way, road_type: &RoadType, edge: &EdgeState) {
        if let Some(store) = self.store.as_mut() {
            store.set_road_type(edge.id, *road_type);
        }
    }

    fn post_process(&mut self, context: &GraphContext) -> Result<(), ExtensionError> {
        let (Some(settings), Some(store)) = (self.settings.as_ref(), self.store.as_mut()) else {
            return Err(ExtensionError::NotInitialized(Self::NAME));
        };

        if !settings.enabled {
            info!("Traffic matching is disabled");
            return Ok(());
        }
        if store.is_matched() {
            info!("Traffic data already matched, skipping");
            return Ok(());
        }

        let data = read_traffic_data(
            &settings.streets,
            &settings.patterns,
            &settings.reference_patterns,
        )?;
        for pattern in data.patterns().values() {
            store.set_pattern(pattern);
        }

        let cache_dir = settings
            .cache_dir
            .clone()
            .unwrap_or_else(|| context.output_dir.to_path_buf());
        let cache = MatchCache::load(&cache_dir);

        let index = EdgeIndex::build_from_graph(context.graph);

        info!("Matching {} traffic links", data.links().len());
        let matches: Vec<LinkMatch> = {
            let matcher = LinkMatcher::new(context.graph, &index, store, settings.radius);
            data.links()
                .par_iter()
                .map(|link| match_link(&matcher, context.graph, &cache, link))
                .collect()
        };

        let mut new_cache = MatchCache::new();
        let mut features = settings.output_log.as_ref().map(|_| Vec::new());

        let statistics = Self::apply_matches(
            store,
            context.graph,
            &data,
            matches,
            settings.radius,
            &mut new_cache,
            features.as_mut(),
        );

        store.set_max_traffic_speeds();
        store.set_matched();

        if let Err(error) = new_cache.save(&cache_dir) {
            warn!("Could not write the traffic match cache: {}", error);
        }
        if let (Some(path), Some(features)) = (settings.output_log.as_ref(), features) {
            write_match_log(path, features)?;
        }

        info!(
            "Traffic matching done: {} edges processed, {} high confidence, {} low confidence, {} unmatched, {} removable",
            statistics.processed_edges,
            statistics.high_confidence,
            statistics.low_confidence,
            statistics.unmatched,
            statistics.removable
        );

        self.statistics = statistics;
        Ok(())
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        self.store
            .as_ref()
            .ok_or(ExtensionError::NotInitialized(Self::NAME))?
            .save_to_file(directory)
    }
}
