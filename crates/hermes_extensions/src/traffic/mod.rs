pub mod here_traffic_builder;
pub mod link_matcher;
pub mod match_cache;
pub mod road_type;
pub mod traffic_link;
pub mod traffic_pattern;
pub mod traffic_reader;
pub mod traffic_storage;
pub mod virtual_edge;
