use std::{path::Path, str::FromStr};

use tracing::info;

use crate::{
    builders::graph_storage_builder::{GraphContext, GraphStorageBuilder},
    codec::{BitMask, MaskFlag},
    config::BuilderConfig,
    error::ExtensionError,
    extension_store::EdgeValueStore,
    graph_edge::EdgeState,
    osm::{
        tag_resolver::{Tags, merge_node_tags, split_values},
        way::Way,
    },
    storage::impl_file_storage,
    types::EdgeId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRestriction {
    No,
    Customers,
    Destination,
    Delivery,
    Private,
    Permissive,
}

impl MaskFlag for AccessRestriction {
    const ALL: &'static [Self] = &[
        AccessRestriction::No,
        AccessRestriction::Customers,
        AccessRestriction::Destination,
        AccessRestriction::Delivery,
        AccessRestriction::Private,
        AccessRestriction::Permissive,
    ];

    fn bit(self) -> u32 {
        match self {
            AccessRestriction::No => 1,
            AccessRestriction::Customers => 2,
            AccessRestriction::Destination => 4,
            AccessRestriction::Delivery => 8,
            AccessRestriction::Private => 16,
            AccessRestriction::Permissive => 32,
        }
    }
}

impl AccessRestriction {
    fn from_tag_value(value: &str) -> Option<Self> {
        match value {
            "no" => Some(AccessRestriction::No),
            "destination" => Some(AccessRestriction::Destination),
            "private" => Some(AccessRestriction::Private),
            "permissive" => Some(AccessRestriction::Permissive),
            "delivery" => Some(AccessRestriction::Delivery),
            "customers" => Some(AccessRestriction::Customers),
            _ => None,
        }
    }
}

pub type AccessRestrictions = BitMask<AccessRestriction>;

/// Vehicle type the restrictions are recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingProfile {
    Car,
    Motorcycle,
    Bike,
    Foot,
}

impl RoutingProfile {
    /// Mode specific keys checked after `access`
    fn mode_tags(&self) -> &'static [&'static str] {
        match self {
            RoutingProfile::Car => &["motorcar", "motor_vehicle"],
            RoutingProfile::Motorcycle => &["motorcycle", "motor_vehicle"],
            RoutingProfile::Bike => &["bicycle"],
            RoutingProfile::Foot => &["foot"],
        }
    }
}

impl FromStr for RoutingProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "car" | "driving-car" | "driving-hgv" | "hgv" => Ok(RoutingProfile::Car),
            "motorcycle" | "driving-motorcycle" => Ok(RoutingProfile::Motorcycle),
            "bike" | "bicycle" | "cycling-regular" | "cycling-road" | "cycling-mountain"
            | "cycling-electric" => Ok(RoutingProfile::Bike),
            "foot" | "foot-walking" | "foot-hiking" | "wheelchair" => Ok(RoutingProfile::Foot),
            other => Err(format!("unknown routing profile {other}")),
        }
    }
}

/// Keys that can carry a restriction for any profile.
const RESTRICTION_TAGS: [&str; 6] = ["motorcar", "motor_vehicle", "vehicle", "access", "bicycle", "foot"];

const RESTRICTIVE_VALUES: [&str; 8] = [
    "private",
    "no",
    "restricted",
    "military",
    "destination",
    "customers",
    "emergency",
    "permissive",
];

/// Values on a mode tag that lift the restrictions of the way for that mode.
const PERMISSIVE_VALUES: [&str; 4] = ["yes", "designated", "official", "permissive"];

fn has_any_value(tags: &Tags, keys: &[&str], values: &[&str]) -> bool {
    keys.iter().any(|key| {
        tags.get(*key)
            .is_some_and(|value| split_values(value).any(|value| values.contains(&value)))
    })
}

pub fn restrictions_for_profile(tags: &Tags, profile: RoutingProfile) -> AccessRestrictions {
    let mut restrictions = AccessRestrictions::empty();

    if !has_any_value(tags, &RESTRICTION_TAGS, &RESTRICTIVE_VALUES) {
        return restrictions;
    }

    let mode_tags = profile.mode_tags();
    if has_any_value(tags, mode_tags, &PERMISSIVE_VALUES) {
        return restrictions;
    }

    for key in std::iter::once(&"access").chain(mode_tags.iter()) {
        if let Some(value) = tags.get(*key) {
            for value in split_values(value) {
                if let Some(restriction) = AccessRestriction::from_tag_value(value) {
                    restrictions.insert(restriction);
                }
            }
        }
    }

    restrictions
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct RoadAccessRestrictionsStore {
    restrictions: EdgeValueStore<u8>,
    use_for_warnings: bool,
}

impl_file_storage!(RoadAccessRestrictionsStore, "road_access_restrictions");

impl RoadAccessRestrictionsStore {
    pub fn new(use_for_warnings: bool) -> Self {
        RoadAccessRestrictionsStore {
            restrictions: EdgeValueStore::new(u8::MAX),
            use_for_warnings,
        }
    }

    pub fn restrictions(&self, edge_id: EdgeId) -> Option<AccessRestrictions> {
        self.restrictions
            .get(edge_id)
            .map(|bits| AccessRestrictions::from_bits(u32::from(bits)))
    }

    pub fn is_used_for_warnings(&self) -> bool {
        self.use_for_warnings
    }

    fn set_restrictions(&mut self, edge_id: EdgeId, restrictions: AccessRestrictions) {
        // Six flags always fit in a byte
        self.restrictions.set(edge_id, restrictions.bits() as u8);
    }
}

pub struct RoadAccessRestrictionsBuilder {
    config: BuilderConfig,
    profile: RoutingProfile,
    store: Option<RoadAccessRestrictionsStore>,
}

impl RoadAccessRestrictionsBuilder {
    pub const NAME: &'static str = "RoadAccessRestrictions";

    pub fn new(config: BuilderConfig) -> Self {
        RoadAccessRestrictionsBuilder {
            config,
            profile: RoutingProfile::Car,
            store: None,
        }
    }

    pub fn profile(&self) -> RoutingProfile {
        self.profile
    }

    pub fn store(&self) -> Option<&RoadAccessRestrictionsStore> {
        self.store.as_ref()
    }
}

impl GraphStorageBuilder for RoadAccessRestrictionsBuilder {
    type Decision = AccessRestrictions;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(Self::NAME));
        }

        self.profile = self.config.parse_or(Self::NAME, "profile", RoutingProfile::Car)?;
        let use_for_warnings = self.config.bool_or("use_for_warnings", false);
        self.store = Some(RoadAccessRestrictionsStore::new(use_for_warnings));

        info!(
            "Recording road access restrictions for {:?}, warnings: {}",
            self.profile, use_for_warnings
        );

        Ok(())
    }

    fn process_way(&self, way: &Way) -> AccessRestrictions {
        restrictions_for_profile(&merge_node_tags(way), self.profile)
    }

    fn process_edge(&mut self, _way: &Way, restrictions: &AccessRestrictions, edge: &EdgeState) {
        if let Some(store) = self.store.as_mut() {
            store.set_restrictions(edge.id, *restrictions);
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
    use crate::test_utils::{edge_state, empty_context};

    fn restrictions(tags: &[(&str, &str)], profile: RoutingProfile) -> u32 {
        let way = Way::new(1, tags.iter().copied(), vec![1, 2]);
        restrictions_for_profile(&merge_node_tags(&way), profile).bits()
    }

    #[test]
    fn test_private_access_yields_private_only() {
        for profile in [RoutingProfile::Car, RoutingProfile::Bike, RoutingProfile::Foot] {
            assert_eq!(
                restrictions(&[("access", "private")], profile),
                AccessRestriction::Private.bit()
            );
        }
    }

    #[test]
    fn test_permissive_foot_lifts_restrictions_for_pedestrians() {
        let tags = [("access", "private"), ("foot", "permissive")];

        assert_eq!(restrictions(&tags, RoutingProfile::Foot), 0);
        assert_eq!(
            restrictions(&tags, RoutingProfile::Car),
            AccessRestriction::Private.bit()
        );
    }

    #[test]
    fn test_mode_tag_values_are_combined() {
        let tags = [("access", "destination"), ("motor_vehicle", "delivery")];
        let expected = AccessRestriction::Destination.bit() | AccessRestriction::Delivery.bit();

        assert_eq!(restrictions(&tags, RoutingProfile::Car), expected);
        assert_eq!(
            restrictions(&tags, RoutingProfile::Bike),
            AccessRestriction::Destination.bit()
        );
    }

    #[test]
    fn test_unrestricted_way_is_zero() {
        assert_eq!(restrictions(&[("highway", "residential")], RoutingProfile::Car), 0);
        assert_eq!(restrictions(&[("access", "delivery")], RoutingProfile::Car), 0);
        assert_eq!(restrictions(&[("access", "military")], RoutingProfile::Car), 0);
    }

    #[test]
    fn test_node_barrier_restricts_the_way() {
        let way = Way::new(1, [("highway", "service")], vec![1, 2, 3])
            .with_node_tags(2, [("barrier", "gate"), ("access", "private")]);

        assert_eq!(
            restrictions_for_profile(&merge_node_tags(&way), RoutingProfile::Car).bits(),
            AccessRestriction::Private.bit()
        );
    }

    #[test]
    fn test_builder_writes_every_edge_and_rejects_second_init() {
        let mut builder = RoadAccessRestrictionsBuilder::new(
            BuilderConfig::new()
                .with("profile", "foot-walking")
                .with("use_for_warnings", "true"),
        );
        let (graph, output) = empty_context();
        let context = GraphContext::new(&graph, &output);

        builder.init(&context).unwrap();
        assert!(matches!(
            builder.init(&context),
            Err(ExtensionError::AlreadyInitialized(_))
        ));

        let way = Way::new(1, [("access", "no")], vec![1, 2]);
        let decision = builder.process_way(&way);
        builder.process_edge(&way, &decision, &edge_state(4));
        let open = Way::new(2, [("highway", "path")], vec![2, 3]);
        let decision = builder.process_way(&open);
        builder.process_edge(&open, &decision, &edge_state(5));

        let store = builder.store().unwrap();
        assert!(store.is_used_for_warnings());
        assert_eq!(
            store.restrictions(4).map(|mask| mask.bits()),
            Some(AccessRestriction::No.bit())
        );
        assert_eq!(store.restrictions(5).map(|mask| mask.bits()), Some(0));
        assert!(store.restrictions(0).is_none());
    }
}
