pub mod csv_index;
pub mod graph_storage_builder;
pub mod registry;
pub mod road_access_restrictions;
pub mod street_crossing;
pub mod way_category;
pub mod way_surface;
