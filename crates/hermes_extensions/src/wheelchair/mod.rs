pub mod measurements;
pub mod wheelchair_attributes;
pub mod wheelchair_builder;
pub mod wheelchair_storage;
pub mod wheelchair_types;
