use jiff::{Timestamp, tz::TimeZone};
use tracing::warn;

use crate::{
    constants::{DAILY_PATTERN_BUCKETS, DAYS_PER_WEEK},
    edge_direction::EdgeDirection,
    error::ExtensionError,
    extension_store::EdgeValueStore,
    storage::impl_file_storage,
    traffic::{
        road_type::RoadType,
        traffic_pattern::{TrafficPattern, quarter_bucket},
    },
    types::{EdgeId, NodeId, PatternId},
};

pub const DEFAULT_TIME_ZONE: &str = "Europe/Berlin";

/// Largest priority stored for an edge direction
pub const MAX_PRIORITY: u32 = u8::MAX as u32;

/// Quarter hour speeds followed by the daily maximum
const PATTERN_ENTRY_BYTES: usize = DAILY_PATTERN_BUCKETS + 1;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize,
)]
pub struct DirectionalTraffic {
    priority: u8,
    pattern_ids: [u16; DAYS_PER_WEEK],
    max_speed: u8,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize,
)]
pub struct EdgeTraffic {
    forward: DirectionalTraffic,
    backward: DirectionalTraffic,
}

impl EdgeTraffic {
    fn direction(&self, direction: EdgeDirection) -> &DirectionalTraffic {
        match direction {
            EdgeDirection::Forward => &self.forward,
            EdgeDirection::Backward => &self.backward,
        }
    }

    fn direction_mut(&mut self, direction: EdgeDirection) -> &mut DirectionalTraffic {
        match direction {
            EdgeDirection::Forward => &mut self.forward,
            EdgeDirection::Backward => &mut self.backward,
        }
    }
}

/// Weekly speed patterns per edge direction, with the road type of every edge.
///
/// A direction is keyed on the node ids it is travelled between, so lookups need the base and
/// adjacent node but not the graph. Pattern id 0 means no traffic data.
#[derive(Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct TrafficStore {
    road_types: EdgeValueStore<u8>,
    edges: Vec<EdgeTraffic>,
    patterns: Vec<[u8; PATTERN_ENTRY_BYTES]>,
    pattern_count: usize,
    time_zone: String,
    matched: bool,
}

impl_file_storage!(TrafficStore, "traffic");

impl TrafficStore {
    pub fn new(time_zone: &str) -> Self {
        TrafficStore {
            road_types: EdgeValueStore::new(u8::MAX),
            edges: Vec::new(),
            patterns: Vec::new(),
            pattern_count: 0,
            time_zone: time_zone.to_string(),
            matched: false,
        }
    }

    pub fn set_road_type(&mut self, edge_id: EdgeId, road_type: RoadType) {
        self.road_types.set(edge_id, road_type.code());
    }

    pub fn road_type(&self, edge_id: EdgeId) -> RoadType {
        self.road_types
            .get(edge_id)
            .map_or(RoadType::Ignore, RoadType::from_code)
    }

    pub fn set_pattern(&mut self, pattern: &TrafficPattern) {
        let Ok(index) = u16::try_from(pattern.id()) else {
            warn!("Traffic pattern id {} does not fit the store, skipped", pattern.id());
            return;
        };
        let index = usize::from(index);

        if index >= self.patterns.len() {
            self.patterns.resize(index + 1, [0; PATTERN_ENTRY_BYTES]);
        }

        let entry = &mut self.patterns[index];
        entry[..DAILY_PATTERN_BUCKETS].copy_from_slice(pattern.speeds());
        entry[DAILY_PATTERN_BUCKETS] = pattern.max_speed();
        self.pattern_count += 1;
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_count
    }

    fn pattern_entry(&self, pattern_id: u16) -> Option<&[u8; PATTERN_ENTRY_BYTES]> {
        self.patterns.get(usize::from(pattern_id))
    }

    /// Speed of a pattern at `hour:minute`, 0 for unknown patterns.
    pub fn pattern_speed(&self, pattern_id: u16, hour: u8, minute: u8) -> u8 {
        self.pattern_entry(pattern_id)
            .map_or(0, |entry| entry[quarter_bucket(hour, minute)])
    }

    fn daily_max_speed(&self, pattern_id: u16) -> u8 {
        self.pattern_entry(pattern_id)
            .map_or(0, |entry| entry[DAILY_PATTERN_BUCKETS])
    }

    /// Assigns a pattern to one weekday of an edge direction, unless the direction was already
    /// written with a higher priority. The priority of a direction never decreases. Returns
    /// whether the entry was written.
    pub fn set_edge_pattern(
        &mut self,
        edge_id: EdgeId,
        base_node: NodeId,
        adj_node: NodeId,
        weekday: usize,
        pattern_id: PatternId,
        priority: u32,
    ) -> bool {
        if pattern_id == 0 || weekday >= DAYS_PER_WEEK {
            return false;
        }

        let priority = priority.min(MAX_PRIORITY) as u8;
        let pattern_id = u16::try_from(pattern_id).unwrap_or(0);

        if edge_id >= self.edges.len() {
            self.edges.resize(edge_id + 1, EdgeTraffic::default());
        }

        let direction = EdgeDirection::of_traversal(base_node, adj_node);
        let traffic = self.edges[edge_id].direction_mut(direction);

        if priority < traffic.priority {
            return false;
        }

        traffic.priority = priority;
        traffic.pattern_ids[weekday] = pattern_id;
        true
    }

    fn directional(
        &self,
        edge_id: EdgeId,
        base_node: NodeId,
        adj_node: NodeId,
    ) -> Option<&DirectionalTraffic> {
        self.edges
            .get(edge_id)
            .map(|traffic| traffic.direction(EdgeDirection::of_traversal(base_node, adj_node)))
    }

    /// Pattern of the edge direction on a weekday, Monday being 0.
    pub fn edge_pattern(
        &self,
        edge_id: EdgeId,
        base_node: NodeId,
        adj_node: NodeId,
        weekday: usize,
    ) -> Option<u16> {
        self.directional(edge_id, base_node, adj_node)
            .and_then(|traffic| traffic.pattern_ids.get(weekday).copied())
            .filter(|pattern_id| *pattern_id > 0)
    }

    pub fn edge_priority(&self, edge_id: EdgeId, base_node: NodeId, adj_node: NodeId) -> u8 {
        self.directional(edge_id, base_node, adj_node)
            .map_or(0, |traffic| traffic.priority)
    }

    /// Patterns are assigned for whole weeks, checking Monday is enough.
    pub fn has_traffic_speed(&self, edge_id: EdgeId, base_node: NodeId, adj_node: NodeId) -> bool {
        self.edge_pattern(edge_id, base_node, adj_node, 0).is_some()
    }

    pub fn time_zone(&self) -> Result<TimeZone, ExtensionError> {
        if self.time_zone.eq_ignore_ascii_case("utc") {
            return Ok(TimeZone::UTC);
        }
        Ok(TimeZone::get(&self.time_zone)?)
    }

    /// Speed in km/h on the edge direction at `timestamp`, in the local time of the store.
    pub fn speed(
        &self,
        edge_id: EdgeId,
        base_node: NodeId,
        adj_node: NodeId,
        timestamp: Timestamp,
    ) -> Result<Option<u8>, ExtensionError> {
        let zoned = timestamp.to_zoned(self.time_zone()?);
        // both fit in a u8 and are never negative
        let weekday = zoned.weekday().to_monday_zero_offset() as usize;
        let (hour, minute) = (zoned.hour() as u8, zoned.minute() as u8);

        Ok(self
            .edge_pattern(edge_id, base_node, adj_node, weekday)
            .map(|pattern_id| self.pattern_speed(pattern_id, hour, minute)))
    }

    /// Highest speed over the week for the edge direction, 0 without traffic data.
    pub fn max_speed(&self, edge_id: EdgeId, base_node: NodeId, adj_node: NodeId) -> u8 {
        self.directional(edge_id, base_node, adj_node)
            .map_or(0, |traffic| traffic.max_speed)
    }

    /// Derives the weekly maximum speed of every edge direction from its daily patterns.
    pub fn set_max_traffic_speeds(&mut self) {
        let mut edges = std::mem::take(&mut self.edges);

        for traffic in &mut edges {
            for direction in [EdgeDirection::Forward, EdgeDirection::Backward] {
                let directional = traffic.direction_mut(direction);
                directional.max_speed = directional
                    .pattern_ids
                    .iter()
                    .filter(|pattern_id| **pattern_id > 0)
                    .map(|pattern_id| self.daily_max_speed(*pattern_id))
                    .max()
                    .unwrap_or(0);
            }
        }

        self.edges = edges;
    }

    /// Number of edge directions holding traffic data
    pub fn traffic_edge_count(&self) -> usize {
        self.edges
            .iter()
            .flat_map(|traffic| [traffic.forward, traffic.backward])
            .filter(|directional| directional.pattern_ids.iter().any(|id| *id > 0))
            .count()
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn set_matched(&mut self) {
        self.matched = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(id: PatternId, speed: u16) -> TrafficPattern {
        let mut values = vec![speed; DAILY_PATTERN_BUCKETS];
        // 08:00 to 08:15
        values[32] = speed / 2;
        TrafficPattern::new(id, &values)
    }

    #[test]
    fn test_higher_priority_wins() {
        let mut store = TrafficStore::new("UTC");

        assert!(store.set_edge_pattern(3, 1, 2, 0, 10, 100));
        assert!(!store.set_edge_pattern(3, 1, 2, 0, 11, 50));
        assert_eq!(store.edge_pattern(3, 1, 2, 0), Some(10));

        assert!(store.set_edge_pattern(3, 1, 2, 0, 12, 100));
        assert_eq!(store.edge_pattern(3, 1, 2, 0), Some(12));

        assert!(store.set_edge_pattern(3, 1, 2, 0, 13, 900));
        assert_eq!(store.edge_priority(3, 1, 2), 255);
    }

    #[test]
    fn test_weaker_match_cannot_lower_the_priority() {
        let mut store = TrafficStore::new("UTC");

        assert!(store.set_edge_pattern(0, 1, 2, 0, 5, 200));
        assert!(!store.set_edge_pattern(0, 1, 2, 1, 6, 50));
        assert!(!store.set_edge_pattern(0, 1, 2, 0, 7, 60));

        assert_eq!(store.edge_pattern(0, 1, 2, 0), Some(5));
        assert_eq!(store.edge_pattern(0, 1, 2, 1), None);
        assert_eq!(store.edge_priority(0, 1, 2), 200);

        assert!(store.set_edge_pattern(0, 1, 2, 1, 8, 200));
        assert_eq!(store.edge_pattern(0, 1, 2, 1), Some(8));
    }

    #[test]
    fn test_directions_are_independent() {
        let mut store = TrafficStore::new("UTC");
        store.set_edge_pattern(0, 4, 9, 2, 5, 10);

        assert_eq!(store.edge_pattern(0, 4, 9, 2), Some(5));
        assert_eq!(store.edge_pattern(0, 9, 4, 2), None);
        assert!(!store.has_traffic_speed(0, 4, 9));
        assert_eq!(store.edge_pattern(42, 4, 9, 2), None);
    }

    #[test]
    fn test_large_pattern_ids_clear_the_entry() {
        let mut store = TrafficStore::new("UTC");
        store.set_edge_pattern(0, 1, 2, 0, 5, 10);
        store.set_edge_pattern(0, 1, 2, 0, 70_000, 10);

        assert_eq!(store.edge_pattern(0, 1, 2, 0), None);
        assert!(!store.set_edge_pattern(0, 1, 2, 0, 0, 10));
    }

    #[test]
    fn test_speed_lookup_by_time() {
        let mut store = TrafficStore::new("UTC");
        store.set_pattern(&pattern(1, 80));
        store.set_pattern(&pattern(2, 40));
        for weekday in 0..DAYS_PER_WEEK {
            let pattern_id = if weekday < 5 { 1 } else { 2 };
            store.set_edge_pattern(0, 1, 2, weekday, pattern_id, 10);
        }

        // a Monday
        let monday_rush: Timestamp = "2024-01-15T08:05:00Z".parse().unwrap();
        let monday_noon: Timestamp = "2024-01-15T12:00:00Z".parse().unwrap();
        let sunday_noon: Timestamp = "2024-01-14T12:00:00Z".parse().unwrap();

        assert_eq!(store.speed(0, 1, 2, monday_rush).unwrap(), Some(40));
        assert_eq!(store.speed(0, 1, 2, monday_noon).unwrap(), Some(80));
        assert_eq!(store.speed(0, 1, 2, sunday_noon).unwrap(), Some(40));
        assert_eq!(store.speed(0, 2, 1, monday_noon).unwrap(), None);
    }

    #[test]
    fn test_weekly_max_speed() {
        let mut store = TrafficStore::new("UTC");
        store.set_pattern(&pattern(1, 80));
        store.set_pattern(&pattern(2, 110));
        store.set_edge_pattern(0, 1, 2, 0, 1, 10);
        store.set_edge_pattern(0, 1, 2, 6, 2, 10);
        store.set_edge_pattern(0, 2, 1, 0, 1, 10);

        store.set_max_traffic_speeds();

        assert_eq!(store.max_speed(0, 1, 2), 110);
        assert_eq!(store.max_speed(0, 2, 1), 80);
        assert_eq!(store.max_speed(1, 1, 2), 0);
        assert_eq!(store.traffic_edge_count(), 2);
    }

    #[test]
    fn test_road_types() {
        let mut store = TrafficStore::new(DEFAULT_TIME_ZONE);
        store.set_road_type(2, RoadType::Primary);

        assert_eq!(store.road_type(2), RoadType::Primary);
        assert_eq!(store.road_type(0), RoadType::Ignore);
        assert_eq!(store.road_type(100), RoadType::Ignore);
    }
}
