use std::path::Path;

use crate::{
    builders::{
        graph_storage_builder::{GraphContext, GraphStorageBuilder},
        way_surface::SurfaceType,
    },
    codec::{BitMask, MaskFlag},
    config::BuilderConfig,
    error::ExtensionError,
    extension_store::EdgeValueStore,
    graph_edge::EdgeState,
    osm::way::Way,
    storage::impl_file_storage,
    types::EdgeId,
};

/// Way features a route can be asked to avoid. The first five are the avoid features, the rest
/// describe the construction of the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayCategory {
    Highways,
    Tollways,
    Steps,
    Ferries,
    Fords,
    Tunnels,
    Bridges,
    Tracks,
    PavedRoads,
    UnpavedRoads,
}

impl MaskFlag for WayCategory {
    const ALL: &'static [Self] = &[
        WayCategory::Highways,
        WayCategory::Tollways,
        WayCategory::Steps,
        WayCategory::Ferries,
        WayCategory::Fords,
        WayCategory::Tunnels,
        WayCategory::Bridges,
        WayCategory::Tracks,
        WayCategory::PavedRoads,
        WayCategory::UnpavedRoads,
    ];

    fn bit(self) -> u32 {
        match self {
            WayCategory::Highways => 1,
            WayCategory::Tollways => 2,
            WayCategory::Steps => 4,
            WayCategory::Ferries => 8,
            WayCategory::Fords => 16,
            WayCategory::Tunnels => 32,
            WayCategory::Bridges => 64,
            WayCategory::Tracks => 128,
            WayCategory::PavedRoads => 256,
            WayCategory::UnpavedRoads => 512,
        }
    }
}

pub type WayCategories = BitMask<WayCategory>;

const FERRY_ROUTES: [&str; 2] = ["ferry", "shuttle_train"];

fn is_ferry(way: &Way) -> bool {
    if !way.has_tag_in("route", &FERRY_ROUTES) {
        return false;
    }

    let motor_vehicle = way.tag("motorcar").or_else(|| way.tag("motor_vehicle"));
    let carries_vehicles = (motor_vehicle.is_none()
        && !way.has_tag("foot")
        && !way.has_tag("bicycle"))
        || motor_vehicle == Some("yes");

    let bicycle = way.tag("bicycle");
    let carries_bicycles = (bicycle.is_none() && !way.has_tag("foot")) || bicycle == Some("yes");

    carries_vehicles || carries_bicycles
}

fn is_tollway(way: &Way) -> bool {
    way.tags()
        .iter()
        .any(|(key, value)| key.starts_with("toll") && value == "yes")
}

pub fn way_categories(way: &Way) -> WayCategories {
    let mut categories = WayCategories::empty();

    if let Some(highway) = way.tag("highway") {
        match highway {
            "motorway" | "motorway_link" => categories.insert(WayCategory::Highways),
            "steps" => categories.insert(WayCategory::Steps),
            "track" => categories.insert(WayCategory::Tracks),
            _ => {}
        }

        match SurfaceType::from_tag(way.tag("surface")) {
            Some(surface) if surface.is_paved() => categories.insert(WayCategory::PavedRoads),
            Some(surface) if surface.is_unpaved() => categories.insert(WayCategory::UnpavedRoads),
            _ => {}
        }
    }

    if is_tollway(way) {
        categories.insert(WayCategory::Tollways);
    }

    if is_ferry(way) {
        categories.insert(WayCategory::Ferries);
    }

    if way.has_tag_value("ford", "yes") {
        categories.insert(WayCategory::Fords);
    }

    if way
        .tag("tunnel")
        .is_some_and(|tunnel| tunnel != "no")
    {
        categories.insert(WayCategory::Tunnels);
    }

    if way
        .tag("bridge")
        .is_some_and(|bridge| bridge != "no")
    {
        categories.insert(WayCategory::Bridges);
    }

    categories
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct WayCategoryStore {
    categories: EdgeValueStore<u16>,
}

impl_file_storage!(WayCategoryStore, "way_category");

impl WayCategoryStore {
    pub fn new() -> Self {
        WayCategoryStore {
            categories: EdgeValueStore::new(u16::MAX),
        }
    }

    pub fn categories(&self, edge_id: EdgeId) -> Option<WayCategories> {
        self.categories
            .get(edge_id)
            .map(|bits| WayCategories::from_bits(u32::from(bits)))
    }
}

impl Default for WayCategoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WayCategoryBuilder {
    store: Option<WayCategoryStore>,
}

impl WayCategoryBuilder {
    pub const NAME: &'static str = "WayCategory";

    pub fn new(_config: BuilderConfig) -> Self {
        WayCategoryBuilder { store: None }
    }

    pub fn store(&self) -> Option<&WayCategoryStore> {
        self.store.as_ref()
    }
}

impl GraphStorageBuilder for WayCategoryBuilder {
    type Decision = WayCategories;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(Self::NAME));
        }
        self.store = Some(WayCategoryStore::new());
        Ok(())
    }

    fn process_way(&self, way: &Way) -> WayCategories {
        way_categories(way)
    }

    fn process_edge(&mut self, _way: &Way, categories: &WayCategories, edge: &EdgeState) {
        let Some(store) = self.store.as_mut() else {
            return;
        };

        // Ten flags never exceed 16 bits
        match categories.to_u16("way category") {
            Ok(bits) => store.categories.set(edge.id, bits),
            Err(error) => panic!("{error}"),
        }
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        self.store
            .as_ref()
            .ok_or(ExtensionError::NotInitialized(Self::NAME))?
            .save_to_file(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(tags: &[(&str, &str)]) -> u32 {
        way_categories(&Way::new(1, tags.iter().copied(), vec![1, 2])).bits()
    }

    #[test]
    fn test_motorway_with_toll() {
        let bits = categories(&[("highway", "motorway"), ("toll", "yes")]);
        assert_eq!(
            bits,
            WayCategory::Highways.bit() | WayCategory::Tollways.bit()
        );

        let hgv_toll = categories(&[("highway", "trunk"), ("toll:hgv", "yes")]);
        assert_eq!(hgv_toll, WayCategory::Tollways.bit());
    }

    #[test]
    fn test_steps_and_fords() {
        assert_eq!(categories(&[("highway", "steps")]), WayCategory::Steps.bit());
        assert_eq!(
            categories(&[("highway", "track"), ("ford", "yes")]),
            WayCategory::Tracks.bit() | WayCategory::Fords.bit()
        );
    }

    #[test]
    fn test_ferry_detection() {
        let ferry = WayCategory::Ferries.bit();

        assert_eq!(categories(&[("route", "ferry")]), ferry);
        assert_eq!(categories(&[("route", "ferry"), ("foot", "yes")]), 0);
        assert_eq!(
            categories(&[("route", "ferry"), ("foot", "yes"), ("motor_vehicle", "yes")]),
            ferry
        );
        assert_eq!(
            categories(&[("route", "ferry"), ("motorcar", "no"), ("bicycle", "yes")]),
            ferry
        );
        assert_eq!(
            categories(&[("route", "ferry"), ("motorcar", "no"), ("bicycle", "no")]),
            0
        );
    }

    #[test]
    fn test_construction_details() {
        let bits = categories(&[
            ("highway", "primary"),
            ("bridge", "viaduct"),
            ("tunnel", "no"),
            ("surface", "asphalt"),
        ]);
        assert_eq!(
            bits,
            WayCategory::Bridges.bit() | WayCategory::PavedRoads.bit()
        );

        assert_eq!(
            categories(&[("highway", "track"), ("surface", "gravel")]),
            WayCategory::Tracks.bit() | WayCategory::UnpavedRoads.bit()
        );
    }
}
