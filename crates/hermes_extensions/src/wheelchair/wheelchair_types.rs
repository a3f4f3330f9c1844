use crate::codec::{Lookup, LookupTable};

pub const SURFACE_MAX: u32 = 30;
pub const SMOOTHNESS_MAX: u32 = 8;
pub const TRACK_TYPE_MAX: u32 = 5;

/// Codes grow with how hard the surface is to roll on.
const SURFACES: LookupTable = LookupTable::new(
    &[
        ("paved", 1),
        ("asphalt", 2),
        ("concrete", 3),
        ("paving_stones", 4),
        ("concrete:plates", 5),
        ("concrete:lanes", 6),
        ("metal", 7),
        ("wood", 8),
        ("compacted", 9),
        ("cobblestone:flattened", 10),
        ("sett", 11),
        ("fine_gravel", 12),
        ("cobblestone", 13),
        ("unhewn_cobblestone", 14),
        ("unpaved", 15),
        ("pebblestone", 16),
        ("gravel", 17),
        ("dirt", 18),
        ("ground", 19),
        ("earth", 20),
        ("grass_paver", 21),
        ("grass", 22),
        ("mud", 23),
        ("sand", 24),
        ("woodchips", 25),
        ("snow", 26),
        ("ice", 27),
        ("salt", 28),
        ("rock", 29),
        ("stepping_stones", 30),
    ],
    0,
);

const SMOOTHNESS: LookupTable = LookupTable::new(
    &[
        ("excellent", 1),
        ("good", 2),
        ("intermediate", 3),
        ("bad", 4),
        ("very_bad", 5),
        ("horrible", 6),
        ("very_horrible", 7),
        ("impassable", 8),
    ],
    0,
);

const TRACK_TYPES: LookupTable = LookupTable::new(
    &[
        ("grade1", 1),
        ("grade2", 2),
        ("grade3", 3),
        ("grade4", 4),
        ("grade5", 5),
    ],
    0,
);

fn known(table: &LookupTable, value: &str) -> Option<u8> {
    match table.lookup(Some(value)) {
        Lookup::Known(code) => Some(code),
        Lookup::Absent | Lookup::Unrecognized => None,
    }
}

/// `None` for values the router cannot rank
pub fn surface_type(value: &str) -> Option<u8> {
    known(&SURFACES, value)
}

pub fn smoothness_type(value: &str) -> Option<u8> {
    known(&SMOOTHNESS, value)
}

pub fn track_type(value: &str) -> Option<u8> {
    known(&TRACK_TYPES, value)
}

pub fn surface_name(code: u8) -> Option<&'static str> {
    SURFACES.decode(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worse_surfaces_have_higher_codes() {
        assert!(surface_type("cobblestone") > surface_type("asphalt"));
        assert!(surface_type("gravel") > surface_type("paving_stones"));
        assert_eq!(surface_type("Asphalt"), Some(2));
        assert_eq!(surface_type("lava"), None);
        assert_eq!(surface_name(13), Some("cobblestone"));
    }

    #[test]
    fn test_smoothness_and_track_types() {
        assert_eq!(smoothness_type("impassable"), Some(SMOOTHNESS_MAX as u8));
        assert_eq!(smoothness_type("so-so"), None);
        assert_eq!(track_type("grade5"), Some(TRACK_TYPE_MAX as u8));
        assert_eq!(track_type("grade6"), None);
    }
}
