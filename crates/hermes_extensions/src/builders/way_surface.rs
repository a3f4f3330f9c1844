use std::path::Path;

use crate::{
    builders::graph_storage_builder::{GraphContext, GraphStorageBuilder},
    codec::{Lookup, LookupTable},
    config::BuilderConfig,
    error::ExtensionError,
    extension_store::EdgeValueStore,
    graph_edge::EdgeState,
    osm::way::Way,
    storage::impl_file_storage,
    types::EdgeId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SurfaceType {
    Unknown = 0,
    Paved = 1,
    Unpaved = 2,
    Asphalt = 3,
    Concrete = 4,
    PavingStones = 5,
    Cobblestone = 6,
    Metal = 7,
    Wood = 8,
    CompactedGravel = 9,
    FineGravel = 10,
    Gravel = 11,
    Dirt = 12,
    Ground = 13,
    Ice = 14,
    Other = 15,
}

const SURFACE_TABLE: LookupTable = LookupTable::new(
    &[
        ("paved", SurfaceType::Paved as u8),
        ("unpaved", SurfaceType::Unpaved as u8),
        ("asphalt", SurfaceType::Asphalt as u8),
        ("chipseal", SurfaceType::Asphalt as u8),
        ("concrete", SurfaceType::Concrete as u8),
        ("concrete:lanes", SurfaceType::Concrete as u8),
        ("concrete:plates", SurfaceType::Concrete as u8),
        ("paving_stones", SurfaceType::PavingStones as u8),
        ("paving_stones:20", SurfaceType::PavingStones as u8),
        ("paving_stones:30", SurfaceType::PavingStones as u8),
        ("paving_stones:50", SurfaceType::PavingStones as u8),
        ("sett", SurfaceType::PavingStones as u8),
        ("cobblestone", SurfaceType::Cobblestone as u8),
        ("cobblestone:flattened", SurfaceType::Cobblestone as u8),
        ("unhewn_cobblestone", SurfaceType::Cobblestone as u8),
        ("metal", SurfaceType::Metal as u8),
        ("wood", SurfaceType::Wood as u8),
        ("compacted", SurfaceType::CompactedGravel as u8),
        ("fine_gravel", SurfaceType::FineGravel as u8),
        ("gravel", SurfaceType::Gravel as u8),
        ("pebblestone", SurfaceType::Gravel as u8),
        ("dirt", SurfaceType::Dirt as u8),
        ("ground", SurfaceType::Ground as u8),
        ("earth", SurfaceType::Ground as u8),
        ("mud", SurfaceType::Ground as u8),
        ("sand", SurfaceType::Ground as u8),
        ("grass", SurfaceType::Ground as u8),
        ("ice", SurfaceType::Ice as u8),
        ("snow", SurfaceType::Ice as u8),
    ],
    SurfaceType::Other as u8,
);

impl SurfaceType {
    const ALL: [SurfaceType; 16] = [
        SurfaceType::Unknown,
        SurfaceType::Paved,
        SurfaceType::Unpaved,
        SurfaceType::Asphalt,
        SurfaceType::Concrete,
        SurfaceType::PavingStones,
        SurfaceType::Cobblestone,
        SurfaceType::Metal,
        SurfaceType::Wood,
        SurfaceType::CompactedGravel,
        SurfaceType::FineGravel,
        SurfaceType::Gravel,
        SurfaceType::Dirt,
        SurfaceType::Ground,
        SurfaceType::Ice,
        SurfaceType::Other,
    ];

    /// `None` when the tag is missing, `Other` for values outside the table.
    pub fn from_tag(value: Option<&str>) -> Option<SurfaceType> {
        match SURFACE_TABLE.lookup(value) {
            Lookup::Absent => None,
            Lookup::Known(code) => Some(Self::from_code(code)),
            Lookup::Unrecognized => Some(SurfaceType::Other),
        }
    }

    pub fn from_code(code: u8) -> SurfaceType {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .unwrap_or(SurfaceType::Unknown)
    }

    pub fn is_paved(&self) -> bool {
        matches!(
            self,
            SurfaceType::Paved
                | SurfaceType::Asphalt
                | SurfaceType::Concrete
                | SurfaceType::PavingStones
                | SurfaceType::Cobblestone
                | SurfaceType::Metal
                | SurfaceType::Wood
        )
    }

    pub fn is_unpaved(&self) -> bool {
        matches!(
            self,
            SurfaceType::Unpaved
                | SurfaceType::CompactedGravel
                | SurfaceType::FineGravel
                | SurfaceType::Gravel
                | SurfaceType::Dirt
                | SurfaceType::Ground
                | SurfaceType::Ice
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WayType {
    Unknown = 0,
    StateRoad = 1,
    Road = 2,
    Street = 3,
    Path = 4,
    Track = 5,
    Cycleway = 6,
    Footway = 7,
    Steps = 8,
    Ferry = 9,
    Construction = 10,
}

impl WayType {
    const ALL: [WayType; 11] = [
        WayType::Unknown,
        WayType::StateRoad,
        WayType::Road,
        WayType::Street,
        WayType::Path,
        WayType::Track,
        WayType::Cycleway,
        WayType::Footway,
        WayType::Steps,
        WayType::Ferry,
        WayType::Construction,
    ];

    pub fn from_highway(highway: &str) -> WayType {
        match highway {
            "primary" | "primary_link" | "motorway" | "motorway_link" | "trunk" | "trunk_link" => {
                WayType::StateRoad
            }
            "secondary" | "secondary_link" | "tertiary" | "tertiary_link" | "road"
            | "unclassified" => WayType::Road,
            "residential" | "service" | "living_street" => WayType::Street,
            "path" | "bridleway" => WayType::Path,
            "track" => WayType::Track,
            "cycleway" => WayType::Cycleway,
            "footway" | "pedestrian" | "crossing" => WayType::Footway,
            "steps" => WayType::Steps,
            "construction" => WayType::Construction,
            _ => WayType::Unknown,
        }
    }

    pub fn of_way(way: &Way) -> WayType {
        if way.has_tag_in("route", &["ferry", "shuttle_train"]) {
            return WayType::Ferry;
        }

        way.tag("highway").map_or(WayType::Unknown, WayType::from_highway)
    }

    pub fn from_code(code: u8) -> WayType {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .unwrap_or(WayType::Unknown)
    }

    fn default_surface(&self) -> SurfaceType {
        match self {
            WayType::StateRoad | WayType::Road | WayType::Street => SurfaceType::Asphalt,
            WayType::Path => SurfaceType::Unpaved,
            _ => SurfaceType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaySurfaceDescription {
    pub way_type: WayType,
    pub surface_type: SurfaceType,
}

impl WaySurfaceDescription {
    pub fn of_way(way: &Way) -> Self {
        let way_type = WayType::of_way(way);
        let surface_type =
            SurfaceType::from_tag(way.tag("surface")).unwrap_or_else(|| way_type.default_surface());

        WaySurfaceDescription {
            way_type,
            surface_type,
        }
    }

    pub fn encode(&self) -> u8 {
        ((self.way_type as u8) << 4) | self.surface_type as u8
    }

    pub fn decode(byte: u8) -> Self {
        WaySurfaceDescription {
            way_type: WayType::from_code(byte >> 4),
            surface_type: SurfaceType::from_code(byte & 0x0F),
        }
    }
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct WaySurfaceTypeStore {
    descriptions: EdgeValueStore<u8>,
}

impl_file_storage!(WaySurfaceTypeStore, "way_surface_type");

impl WaySurfaceTypeStore {
    pub fn new() -> Self {
        WaySurfaceTypeStore {
            descriptions: EdgeValueStore::new(u8::MAX),
        }
    }

    pub fn description(&self, edge_id: EdgeId) -> Option<WaySurfaceDescription> {
        self.descriptions
            .get(edge_id)
            .map(WaySurfaceDescription::decode)
    }
}

impl Default for WaySurfaceTypeStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WaySurfaceTypeBuilder {
    store: Option<WaySurfaceTypeStore>,
}

impl WaySurfaceTypeBuilder {
    pub const NAME: &'static str = "WaySurfaceType";

    pub fn new(_config: BuilderConfig) -> Self {
        WaySurfaceTypeBuilder { store: None }
    }

    pub fn store(&self) -> Option<&WaySurfaceTypeStore> {
        self.store.as_ref()
    }
}

impl GraphStorageBuilder for WaySurfaceTypeBuilder {
    type Decision = WaySurfaceDescription;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(Self::NAME));
        }
        self.store = Some(WaySurfaceTypeStore::new());
        Ok(())
    }

    fn process_way(&self, way: &Way) -> WaySurfaceDescription {
        WaySurfaceDescription::of_way(way)
    }

    fn process_edge(&mut self, _way: &Way, description: &WaySurfaceDescription, edge: &EdgeState) {
        if let Some(store) = self.store.as_mut() {
            store.descriptions.set(edge.id, description.encode());
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

    fn describe(tags: &[(&str, &str)]) -> WaySurfaceDescription {
        WaySurfaceDescription::of_way(&Way::new(1, tags.iter().copied(), vec![1, 2]))
    }

    #[test]
    fn test_surface_defaults_from_way_type() {
        assert_eq!(
            describe(&[("highway", "residential")]),
            WaySurfaceDescription {
                way_type: WayType::Street,
                surface_type: SurfaceType::Asphalt
            }
        );
        assert_eq!(describe(&[("highway", "path")]).surface_type, SurfaceType::Unpaved);
        assert_eq!(describe(&[("highway", "steps")]).surface_type, SurfaceType::Unknown);
    }

    #[test]
    fn test_surface_tag_overrides_default() {
        let description = describe(&[("highway", "primary"), ("surface", "cobblestone")]);
        assert_eq!(description.way_type, WayType::StateRoad);
        assert_eq!(description.surface_type, SurfaceType::Cobblestone);

        assert_eq!(
            describe(&[("highway", "track"), ("surface", "moon_dust")]).surface_type,
            SurfaceType::Other
        );
    }

    #[test]
    fn test_ferry_route_forces_ferry_type() {
        let description = describe(&[("route", "ferry"), ("highway", "service")]);
        assert_eq!(description.way_type, WayType::Ferry);
    }

    #[test]
    fn test_descriptor_packing() {
        for tags in [
            vec![("highway", "secondary"), ("surface", "gravel")],
            vec![("highway", "footway"), ("surface", "wood")],
            vec![("highway", "construction")],
        ] {
            let description = describe(&tags);
            assert_eq!(WaySurfaceDescription::decode(description.encode()), description);
            assert_ne!(description.encode(), u8::MAX);
        }
    }
}
