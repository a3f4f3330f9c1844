use tracing::warn;

use crate::codec::ClampedValue;

/// Larger values would not fit the width field
const MAX_LINEAR_METERS: f64 = 3.0;

/// A unit-less kerb height below this is read as meters, anything else as centimeters.
const KERB_METERS_THRESHOLD: f64 = 0.15;

pub const KERB_HEIGHT_MAX: u32 = 15;
const KERB_HEIGHT: ClampedValue = ClampedValue::new("kerb height", KERB_HEIGHT_MAX);

pub const INCLINE_MAX: f64 = 15.0;

const METERS_PER_INCH: f64 = 0.0254;

fn unit_to_meters(value: f64, unit: &str) -> Option<f64> {
    match unit {
        "m" => Some(value),
        "km" => Some(value * 1000.0),
        "cm" => Some(value / 100.0),
        "mi" => Some(value / 0.000_621_371),
        "nmi" => Some(value / 0.000_539_957),
        _ => None,
    }
}

fn parse_feet_and_inches(value: &str) -> Option<f64> {
    let (feet, inches) = value.split_once('\'')?;
    let inches = inches.trim().trim_end_matches('"').trim();
    let inches = if inches.is_empty() {
        0.0
    } else {
        inches.parse::<f64>().ok()?
    };

    Some((feet.trim().parse::<f64>().ok()? * 12.0 + inches) * METERS_PER_INCH)
}

fn parse_with_unit_suffix(value: &str) -> Option<f64> {
    // cm and km before m, nmi before mi
    ["cm", "km", "nmi", "mi", "m"].iter().find_map(|unit| {
        let number = value.strip_suffix(unit)?.trim().parse::<f64>().ok()?;
        unit_to_meters(number, unit)
    })
}

/// Reads an OSM length (`2`, `2 m`, `150 cm`, `6'7"`, `1.5km`...) in meters, capped at 3 meters.
pub fn convert_linear_value_to_metres(value: &str) -> Option<f64> {
    let value = value.trim().to_lowercase();

    let parsed = if let Some((number, unit)) = value.split_once(' ') {
        number
            .parse::<f64>()
            .ok()
            .and_then(|number| unit_to_meters(number, unit.trim()))
    } else if value.contains('\'') && value.contains('"') {
        parse_feet_and_inches(&value)
    } else {
        value.parse::<f64>().ok()
    };
    let meters = parsed.or_else(|| parse_with_unit_suffix(&value))?;

    if meters < 0.0 || meters.is_nan() {
        return None;
    }

    Some(meters.min(MAX_LINEAR_METERS))
}

/// Width in centimeters
pub fn width_in_centimeters(value: &str) -> Option<u32> {
    // at most 300 once capped
    convert_linear_value_to_metres(value).map(|meters| (meters * 100.0) as u32)
}

/// Kerb keys read from ways and nodes, the last present one wins.
pub const KERB_KEYS: [&str; 5] = ["curb", "kerb", "sloped_curb", "sloped_kerb", "kerb:height"];

fn textual_kerb_height(value: &str) -> Option<f64> {
    match value {
        "yes" | "both" | "low" | "lowered" | "dropped" | "sloped" => Some(3.0),
        "no" | "none" | "one" | "rolled" | "regular" => Some(15.0),
        "at_grade" | "flush" => Some(0.0),
        _ => None,
    }
}

/// Kerb height in centimeters, clamped to the storable maximum.
///
/// `kerb:height` only accepts measurements, the other keys also take descriptive values. A plain
/// number without unit is ambiguous: small values are taken as meters, others as centimeters.
pub fn kerb_height(key: &str, value: &str) -> Option<u8> {
    let value = value.trim().to_lowercase();

    let descriptive = if key == "kerb:height" {
        None
    } else {
        textual_kerb_height(&value)
    };

    let centimeters = descriptive.or_else(|| match value.parse::<f64>() {
        Ok(number) if number < KERB_METERS_THRESHOLD => Some(number * 100.0),
        Ok(number) => Some(number),
        Err(_) => convert_linear_value_to_metres(&value).map(|meters| meters * 100.0),
    })?;

    // clamped to KERB_HEIGHT_MAX
    Some(KERB_HEIGHT.encode(centimeters) as u8)
}

/// Incline in percent, absolute and capped at 15.
pub fn incline_percentage(value: &str) -> Option<u8> {
    let mut value = value.trim().to_lowercase().replace('%', "").replace(',', ".");

    let is_degree = value.contains('°');
    if is_degree {
        value = value.replace('°', "");
    }

    let value = value.trim();
    let incline = match value {
        "up" | "down" | "yes" => 10.0,
        "steep" => 15.0,
        "no" | "+/-0" => 0.0,
        number => {
            let number = number.trim_start_matches('+').parse::<f64>().ok()?;
            if is_degree {
                number.to_radians().tan() * 100.0
            } else {
                number
            }
        }
    };

    if incline.is_nan() {
        return None;
    }

    let incline = incline.abs();
    if incline > INCLINE_MAX {
        warn!("Incline {} exceeds {}%, capped", value, INCLINE_MAX);
    }

    // at most 15 after the cap
    Some(incline.min(INCLINE_MAX).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_meters(value: &str, expected: f64) {
        let meters = convert_linear_value_to_metres(value).unwrap();
        assert!((meters - expected).abs() < 1e-6, "{value}: {meters}");
    }

    #[test]
    fn test_linear_units() {
        assert_meters("2", 2.0);
        assert_meters("1.2 m", 1.2);
        assert_meters("150 cm", 1.5);
        assert_meters("90cm", 0.9);
        assert_meters("0.001km", 1.0);
        assert_meters("3'3\"", 0.9906);
        assert_meters("12", 3.0);
        assert_meters("1 mi", 3.0);

        assert!(convert_linear_value_to_metres("wide").is_none());
        assert!(convert_linear_value_to_metres("2 furlongs").is_none());
    }

    #[test]
    fn test_kerb_heuristic() {
        assert_eq!(kerb_height("kerb", "0.03"), Some(3));
        assert_eq!(kerb_height("kerb", "15"), Some(15));
        assert_eq!(kerb_height("kerb", "flush"), Some(0));
        assert_eq!(kerb_height("kerb:height", "0.03"), Some(3));
        assert_eq!(kerb_height("kerb:height", "4"), Some(4));
    }

    #[test]
    fn test_kerb_descriptions() {
        assert_eq!(kerb_height("kerb", "lowered"), Some(3));
        assert_eq!(kerb_height("curb", "Regular"), Some(15));
        assert_eq!(kerb_height("sloped_curb", "at_grade"), Some(0));
        assert_eq!(kerb_height("kerb:height", "lowered"), None);
        assert_eq!(kerb_height("kerb", "raised"), None);
    }

    #[test]
    fn test_kerb_units_and_clamping() {
        assert_eq!(kerb_height("kerb:height", "5 cm"), Some(5));
        assert_eq!(kerb_height("kerb:height", "0.1 m"), Some(10));
        assert_eq!(kerb_height("kerb:height", "25"), Some(15));
        assert_eq!(kerb_height("kerb:height", "1 m"), Some(15));
    }

    #[test]
    fn test_incline() {
        assert_eq!(incline_percentage("6%"), Some(6));
        assert_eq!(incline_percentage("-4,6%"), Some(5));
        assert_eq!(incline_percentage("up"), Some(10));
        assert_eq!(incline_percentage("steep"), Some(15));
        assert_eq!(incline_percentage("no"), Some(0));
        assert_eq!(incline_percentage("40%"), Some(15));
        assert_eq!(incline_percentage("5°"), Some(9));
        assert_eq!(incline_percentage("sideways"), None);
    }

    #[test]
    fn test_width() {
        assert_eq!(width_in_centimeters("1.5"), Some(150));
        assert_eq!(width_in_centimeters("5 m"), Some(300));
        assert_eq!(width_in_centimeters("narrow"), None);
    }
}
