use std::path::Path;

use tracing::info;

use crate::{
    builders::graph_storage_builder::{GraphContext, GraphStorageBuilder},
    config::BuilderConfig,
    error::ExtensionError,
    graph_edge::EdgeState,
    osm::{tag_resolver::Tags, way::Way},
    types::OsmNodeId,
    wheelchair::{
        measurements::{KERB_KEYS, incline_percentage, kerb_height, width_in_centimeters},
        wheelchair_attributes::{Side, WheelchairAttributes},
        wheelchair_storage::WheelchairStore,
        wheelchair_types::{smoothness_type, surface_type, track_type},
    },
};

const SEPARATE_FOOTWAYS: [&str; 5] = ["living_street", "pedestrian", "footway", "path", "crossing"];

/// Tag holding the side of the road a mapped sidewalk way belongs to
const SIDEWALK_SIDE_TAG: &str = "ors-sidewalk-side";

/// Attribute sets of a way, resolved once and shared by all of its edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WheelchairWayDecision {
    pub general: WheelchairAttributes,
    pub left: Option<WheelchairAttributes>,
    pub right: Option<WheelchairAttributes>,
    pub sidewalk_side: Option<Side>,
}

fn is_separate_footway(way: &Way) -> bool {
    way.tag("highway")
        .is_none_or(|highway| SEPARATE_FOOTWAYS.contains(&highway))
}

/// Kerb height of the last kerb key carrying a usable value.
fn last_kerb_height<'a>(tag: impl Fn(&str) -> Option<&'a str>) -> Option<u8> {
    KERB_KEYS
        .into_iter()
        .filter_map(|key| tag(key).and_then(|value| kerb_height(key, value)))
        .last()
}

fn node_kerb_height(tags: &Tags) -> Option<u8> {
    last_kerb_height(|key| tags.get(key).map(|value| value.as_str()))
}

fn general_attributes(way: &Way) -> WheelchairAttributes {
    let mut general = WheelchairAttributes {
        surface_quality_known: true,
        suitable: true,
        ..Default::default()
    };

    if let Some(surface) = way.tag("surface").and_then(surface_type) {
        general.surface = surface;
    }
    if let Some(smoothness) = way.tag("smoothness").and_then(smoothness_type) {
        general.smoothness = smoothness;
    }
    if let Some(track) = way.tag("tracktype").and_then(track_type) {
        general.track_type = track;
    }

    general.width = way.tag("width").and_then(width_in_centimeters);
    general.kerb_height = last_kerb_height(|key| way.tag(key));
    general.incline = way
        .tag("incline")
        .and_then(incline_percentage)
        .filter(|incline| *incline != 0);

    general
}

/// Sided value for `attribute`: the `both` variants win over the side ones, `sidewalk:` over `footway:`.
fn sided_tag<'a>(way: &'a Way, side: &str, attribute: &str) -> Option<&'a str> {
    ["both", side].iter().find_map(|prefix_side| {
        way.tag(&format!("sidewalk:{prefix_side}:{attribute}"))
            .or_else(|| way.tag(&format!("footway:{prefix_side}:{attribute}")))
    })
}

/// Kerb height of one side. Per key the worst of the plain, `:start` and `:end` variants counts,
/// and a later key overrides an earlier one.
fn sided_kerb_height(way: &Way, side: &str) -> Option<u8> {
    KERB_KEYS
        .into_iter()
        .filter_map(|key| {
            ["", ":start", ":end"]
                .into_iter()
                .filter_map(|suffix| {
                    sided_tag(way, side, &format!("{key}{suffix}"))
                        .and_then(|value| kerb_height(key, value))
                })
                .max()
        })
        .last()
}

/// Attributes of one sidewalk, `None` when the way has no sidewalk on that side. Kerbs tagged on
/// the way itself only describe the sidewalks of roads, a separate footway keeps them in its
/// general attributes.
fn side_attributes(way: &Way, side: Side, separate_footway: bool) -> Option<WheelchairAttributes> {
    let side_name = match side {
        Side::Left => "left",
        Side::Right => "right",
        Side::Unknown => return None,
    };

    let mut present = way.tag("sidewalk").is_some_and(|sidewalk| {
        sidewalk == "both" || sidewalk == side_name
    });
    let mut attributes = WheelchairAttributes {
        side,
        ..Default::default()
    };

    if let Some(value) = sided_tag(way, side_name, "surface") {
        present = true;
        attributes.surface = surface_type(value).unwrap_or_default();
    }
    if let Some(value) = sided_tag(way, side_name, "smoothness") {
        present = true;
        attributes.smoothness = smoothness_type(value).unwrap_or_default();
    }
    if let Some(value) = sided_tag(way, side_name, "tracktype") {
        present = true;
        attributes.track_type = track_type(value).unwrap_or_default();
    }
    if let Some(value) = sided_tag(way, side_name, "width") {
        present = true;
        attributes.width = width_in_centimeters(value);
    }

    attributes.incline = match sided_tag(way, side_name, "incline") {
        Some(value) => {
            present = true;
            incline_percentage(value)
        }
        None => way.tag("incline").and_then(incline_percentage),
    }
    .filter(|incline| *incline != 0);

    let way_kerb = if separate_footway {
        None
    } else {
        last_kerb_height(|key| way.tag(key))
    };
    if let Some(kerb) = sided_kerb_height(way, side_name).or(way_kerb) {
        present = true;
        attributes.kerb_height = Some(kerb);
    }

    attributes.surface_quality_known = attributes.has_classification();
    attributes.suitable = attributes.has_classification();

    present.then_some(attributes)
}

pub fn wheelchair_way_decision(way: &Way) -> WheelchairWayDecision {
    let sidewalk_side = match way.tag(SIDEWALK_SIDE_TAG) {
        Some("left") => Some(Side::Left),
        Some("right") => Some(Side::Right),
        _ => None,
    };

    let separate_footway = is_separate_footway(way);
    let general = if separate_footway {
        general_attributes(way)
    } else {
        WheelchairAttributes::default()
    };

    // separate footways can carry sidewalk tags too
    WheelchairWayDecision {
        general,
        left: side_attributes(way, Side::Left, separate_footway),
        right: side_attributes(way, Side::Right, separate_footway),
        sidewalk_side,
    }
}

/// Worst of every value over the general set and the present sides, smallest known width. The
/// flags of an empty general set are ignored.
fn combine(general: &WheelchairAttributes, sides: &[&WheelchairAttributes]) -> WheelchairAttributes {
    let general_known = general.has_values();

    let worst = |value: fn(&WheelchairAttributes) -> u8| {
        sides.iter().map(|side| value(side)).fold(value(general), u8::max)
    };
    let worst_optional = |value: fn(&WheelchairAttributes) -> Option<u8>| {
        sides.iter().filter_map(|side| value(side)).chain(value(general)).max()
    };

    WheelchairAttributes {
        surface: worst(|attributes| attributes.surface),
        smoothness: worst(|attributes| attributes.smoothness),
        track_type: worst(|attributes| attributes.track_type),
        width: sides
            .iter()
            .filter_map(|side| side.width)
            .chain(general.width)
            .filter(|width| *width > 0)
            .min(),
        incline: worst_optional(|attributes| attributes.incline),
        kerb_height: worst_optional(|attributes| attributes.kerb_height),
        side: Side::Unknown,
        surface_quality_known: (!general_known || general.surface_quality_known)
            && sides.iter().all(|side| side.surface_quality_known),
        suitable: (!general_known || general.suitable) && sides.iter().all(|side| side.suitable),
    }
}

pub struct WheelchairBuilder {
    config: BuilderConfig,
    kerbs_on_crossings: bool,
    store: Option<WheelchairStore>,
}

impl WheelchairBuilder {
    pub const NAME: &'static str = "Wheelchair";

    pub fn new(config: BuilderConfig) -> Self {
        WheelchairBuilder {
            config,
            kerbs_on_crossings: false,
            store: None,
        }
    }

    pub fn store(&self) -> Option<&WheelchairStore> {
        self.store.as_ref()
    }

    fn edge_attributes(
        &self,
        way: &Way,
        decision: &WheelchairWayDecision,
        edge: &EdgeState,
    ) -> WheelchairAttributes {
        let mut attributes = decision.general;

        if let Some(marked) = decision.sidewalk_side {
            let selected = match marked {
                Side::Left => decision.left,
                Side::Right => decision.right,
                Side::Unknown => None,
            };
            attributes = attributes.merge(&selected.unwrap_or_default());
            // the tagged side seen in the direction of travel
            attributes.side = if edge.reversed {
                marked.opposite()
            } else {
                marked
            };
        } else {
            let present: Vec<&WheelchairAttributes> =
                [&decision.left, &decision.right].into_iter().flatten().collect();
            if !present.is_empty() {
                attributes = combine(&decision.general, &present);
            }
        }

        let applies_to_edge =
            !self.kerbs_on_crossings || way.has_tag_value("footway", "crossing");
        if applies_to_edge {
            let node_kerb = [edge.base_osm_node, edge.adj_osm_node]
                .into_iter()
                .filter_map(|node: OsmNodeId| way.node_tags(node).and_then(node_kerb_height))
                .max();
            if node_kerb.is_some() {
                attributes.kerb_height = node_kerb;
            }
        }

        attributes
    }
}

impl GraphStorageBuilder for WheelchairBuilder {
    type Decision = WheelchairWayDecision;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(Self::NAME));
        }

        self.kerbs_on_crossings = self.config.bool_or("KerbsOnCrossings", false);
        self.store = Some(WheelchairStore::new());
        info!("Wheelchair kerbs only on crossings: {}", self.kerbs_on_crossings);
        Ok(())
    }

    fn process_way(&self, way: &Way) -> WheelchairWayDecision {
        wheelchair_way_decision(way)
    }

    fn process_edge(&mut self, way: &Way, decision: &WheelchairWayDecision, edge: &EdgeState) {
        let attributes = self.edge_attributes(way, decision, edge);
        if !attributes.has_values() {
            return;
        }

        if let Some(store) = self.store.as_mut()
            && let Err(error) = store.set_attributes(edge.id, &attributes)
        {
            panic!("wheelchair attributes of way {} cannot be stored: {error}", way.id());
        }
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        self.store
            .as_ref()
            .ok_or(ExtensionError::NotInitialized(Self::NAME))?
            .save_to_file(directory)
    }
}
