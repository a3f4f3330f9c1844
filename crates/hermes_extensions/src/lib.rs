pub mod base_graph;
pub mod builders;
pub mod codec;
pub mod config;
pub mod constants;
pub mod edge_direction;
pub mod error;
pub mod extension_store;
pub mod geometry;
pub mod geopoint;
pub mod graph;
pub mod graph_builder;
pub mod graph_edge;
pub mod location_index;
pub mod osm;
pub mod query_graph;
pub mod snap;
pub mod storage;
pub mod traffic;
pub mod types;
pub mod wheelchair;

#[cfg(test)]
pub(crate) mod test_utils;
