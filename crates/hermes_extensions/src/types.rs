pub type NodeId = usize;
pub type EdgeId = usize;

pub type OsmNodeId = i64;
pub type OsmWayId = i64;

pub type TrafficLinkId = u32;
pub type PatternId = u32;
