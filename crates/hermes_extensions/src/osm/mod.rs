pub mod osm_reader;
pub mod tag_resolver;
pub mod way;
