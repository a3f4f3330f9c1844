use std::path::Path;

use fxhash::FxHashMap;
use geojson::{Feature, GeoJson};
use tracing::{debug, info, warn};

use crate::{
    constants::DAYS_PER_WEEK,
    error::ExtensionError,
    geopoint::GeoPoint,
    traffic::{
        road_type::FunctionalClass,
        traffic_link::{LinkTravel, TrafficLink, TravelDirection, WeeklyPatterns},
        traffic_pattern::TrafficPattern,
    },
    types::{PatternId, TrafficLinkId},
};

/// Link id, direction and one pattern id per weekday, Sunday first
const REFERENCE_PATTERN_COLUMNS: usize = 2 + DAYS_PER_WEEK;

/// Traffic links with their weekly patterns resolved, ready to be matched.
#[derive(Debug, Default)]
pub struct TrafficData {
    links: Vec<TrafficLink>,
    patterns: FxHashMap<PatternId, TrafficPattern>,
}

impl TrafficData {
    pub fn new(links: Vec<TrafficLink>, patterns: FxHashMap<PatternId, TrafficPattern>) -> Self {
        TrafficData { links, patterns }
    }

    pub fn links(&self) -> &[TrafficLink] {
        &self.links
    }

    pub fn patterns(&self) -> &FxHashMap<PatternId, TrafficPattern> {
        &self.patterns
    }

    pub fn pattern(&self, id: PatternId) -> Option<&TrafficPattern> {
        self.patterns.get(&id)
    }
}

fn property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(value) => Some(value.trim().to_string()),
        serde_json::Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn line_geometry(feature: &Feature) -> Option<Vec<GeoPoint>> {
    let line = match &feature.geometry.as_ref()?.value {
        geojson::Value::LineString(line) => line,
        geojson::Value::MultiLineString(lines) if lines.len() == 1 => &lines[0],
        _ => return None,
    };

    line.iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Some(GeoPoint::new(*lon, *lat)),
            _ => None,
        })
        .collect()
}

fn feature_to_link(feature: &Feature) -> Option<TrafficLink> {
    let id = property(feature, "LINK_ID")?.parse::<TrafficLinkId>().ok()?;
    let functional_class = property(feature, "FUNC_CLASS")
        .and_then(|class| class.parse::<u8>().ok())
        .and_then(FunctionalClass::from_code)?;
    let travel = property(feature, "DIR_TRAVEL")
        .and_then(|travel| LinkTravel::from_code(&travel))
        .unwrap_or(LinkTravel::Both);
    let ramp = property(feature, "RAMP").is_some_and(|ramp| ramp.eq_ignore_ascii_case("y"));

    let Some(geometry) = line_geometry(feature) else {
        debug!("Skipping traffic link {} with malformed geometry", id);
        return None;
    };

    Some(TrafficLink::new(id, geometry, functional_class, ramp, travel))
}

/// Reads the street geometries of the traffic links from a GeoJSON feature collection.
pub fn read_streets(path: &Path) -> Result<Vec<TrafficLink>, ExtensionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ExtensionError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let geojson = contents
        .parse::<GeoJson>()
        .map_err(|source| ExtensionError::GeoJson {
            path: path.display().to_string(),
            source,
        })?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => vec![],
    };

    let total = features.len();
    let links: Vec<TrafficLink> = features.iter().filter_map(feature_to_link).collect();

    if links.len() < total {
        warn!("Skipped {} of {} traffic links", total - links.len(), total);
    }
    info!("{} traffic links found in {}", links.len(), path.display());

    Ok(links)
}

fn csv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, ExtensionError> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| ExtensionError::Csv {
            path: path.display().to_string(),
            source,
        })
}

fn parse_reference_row(
    record: &csv::StringRecord,
) -> Option<(TrafficLinkId, TravelDirection, WeeklyPatterns)> {
    if record.len() != REFERENCE_PATTERN_COLUMNS {
        return None;
    }

    let link_id = record.get(0)?.trim().parse::<TrafficLinkId>().ok()?;
    let direction = TravelDirection::from_code(record.get(1)?)?;

    let mut patterns = [0; DAYS_PER_WEEK];
    for (column, value) in record.iter().skip(2).enumerate() {
        // Sunday moves to the end of the week
        patterns[(column + DAYS_PER_WEEK - 1) % DAYS_PER_WEEK] =
            value.trim().parse::<PatternId>().ok()?;
    }

    Some((link_id, direction, patterns))
}

/// Weekly pattern references per link and direction. Rows that are not a complete week are skipped.
pub fn read_reference_patterns(
    path: &Path,
) -> Result<FxHashMap<(TrafficLinkId, TravelDirection), WeeklyPatterns>, ExtensionError> {
    let mut reader = csv_reader(path)?;
    let mut references = FxHashMap::default();
    let mut skipped = 0;

    for record in reader.records() {
        match record.ok().as_ref().and_then(parse_reference_row) {
            Some((link_id, direction, patterns)) => {
                references.insert((link_id, direction), patterns);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} incomplete reference pattern rows in {}", skipped, path.display());
    }

    Ok(references)
}

fn parse_pattern_row(record: &csv::StringRecord) -> Option<TrafficPattern> {
    let id = record.get(0)?.trim().parse::<PatternId>().ok()?;
    let values = record
        .iter()
        .skip(1)
        .map(|value| value.trim().parse::<u16>().ok())
        .collect::<Option<Vec<u16>>>()?;

    Some(TrafficPattern::new(id, &values))
}

/// Daily speed patterns, one row per pattern: id followed by the quarter hour speeds.
pub fn read_patterns(path: &Path) -> Result<FxHashMap<PatternId, TrafficPattern>, ExtensionError> {
    let mut reader = csv_reader(path)?;
    let mut patterns = FxHashMap::default();
    let mut skipped = 0;

    for record in reader.records() {
        match record.ok().as_ref().and_then(parse_pattern_row) {
            Some(pattern) => {
                patterns.insert(pattern.id(), pattern);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed pattern rows in {}", skipped, path.display());
    }

    Ok(patterns)
}

/// Reads the three traffic files and assigns to each link the weekly patterns of its directions.
/// Pattern references to unknown patterns are dropped, and only patterns referenced by a link are
/// kept.
pub fn read_traffic_data(
    streets: &Path,
    patterns: &Path,
    reference_patterns: &Path,
) -> Result<TrafficData, ExtensionError> {
    let mut links = read_streets(streets)?;
    let mut all_patterns = read_patterns(patterns)?;
    let references = read_reference_patterns(reference_patterns)?;

    let mut used_patterns = FxHashMap::default();

    for link in &mut links {
        for direction in [TravelDirection::From, TravelDirection::To] {
            let Some(weekly) = references.get(&(link.id(), direction)) else {
                continue;
            };

            let mut resolved = [0; DAYS_PER_WEEK];
            for (day, pattern_id) in weekly.iter().enumerate() {
                if let Some(pattern) = all_patterns.remove(pattern_id) {
                    used_patterns.insert(*pattern_id, pattern);
                }
                if used_patterns.contains_key(pattern_id) {
                    resolved[day] = *pattern_id;
                }
            }

            if resolved.iter().any(|pattern_id| *pattern_id > 0) {
                link.set_patterns(direction, resolved);
            }
        }
    }

    info!(
        "Traffic data read: {} links, {} patterns",
        links.len(),
        used_patterns.len()
    );

    Ok(TrafficData::new(links, used_patterns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::DAILY_PATTERN_BUCKETS, test_utils::write_temp_file};

    const STREETS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "LINK_ID": 10, "FUNC_CLASS": "3", "DIR_TRAVEL": "B", "RAMP": "N" },
                "geometry": { "type": "MultiLineString", "coordinates": [[[4.0, 50.0], [4.001, 50.0]]] }
            },
            {
                "type": "Feature",
                "properties": { "LINK_ID": "11", "FUNC_CLASS": 1, "DIR_TRAVEL": "T", "RAMP": "Y" },
                "geometry": { "type": "LineString", "coordinates": [[4.001, 50.0], [4.002, 50.0]] }
            },
            {
                "type": "Feature",
                "properties": { "LINK_ID": 12, "FUNC_CLASS": 2 },
                "geometry": { "type": "MultiLineString", "coordinates": [[[4.0, 50.0], [4.1, 50.0]], [[4.2, 50.0], [4.3, 50.0]]] }
            }
        ]
    }"#;

    #[test]
    fn test_read_streets() {
        let path = write_temp_file("traffic_streets.geojson", STREETS);
        let links = read_streets(&path).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].id(), 10);
        assert_eq!(links[0].functional_class(), FunctionalClass::Class3);
        assert_eq!(links[0].travel(), LinkTravel::Both);
        assert_eq!(links[0].geometry().len(), 2);

        assert_eq!(links[1].id(), 11);
        assert!(links[1].is_ramp());
        assert_eq!(links[1].travel(), LinkTravel::ToOnly);
    }

    #[test]
    fn test_reference_rows_need_a_full_week() {
        let path = write_temp_file(
            "traffic_reference.csv",
            "LINK_PVID,TRAVEL_DIRECTION,U,M,T,W,R,F,S\n\
             10,F,1,1,1,1,1,2,2\n\
             10,T,1,1,1\n\
             11,X,1,1,1,1,1,1,1\n",
        );

        let references = read_reference_patterns(&path).unwrap();

        assert_eq!(references.len(), 1);
        assert_eq!(
            references.get(&(10, TravelDirection::From)),
            Some(&[1, 1, 1, 1, 2, 2, 1])
        );
    }

    #[test]
    fn test_patterns_are_assigned_to_links() {
        let streets = write_temp_file("traffic_assign_streets.geojson", STREETS);
        let speeds = vec!["50"; DAILY_PATTERN_BUCKETS].join(",");
        let patterns = write_temp_file(
            "traffic_assign_patterns.csv",
            &format!("PATTERN_ID,SPEEDS\n1,{speeds}\n2,{speeds}\n3,oops\n"),
        );
        let references = write_temp_file(
            "traffic_assign_references.csv",
            "LINK_PVID,TRAVEL_DIRECTION,U,M,T,W,R,F,S\n\
             10,T,1,1,1,1,1,2,2\n\
             11,T,9,9,9,9,9,9,9\n",
        );

        let data = read_traffic_data(&streets, &patterns, &references).unwrap();

        assert_eq!(data.patterns().len(), 2);
        assert_eq!(data.links()[0].patterns(TravelDirection::To), Some(&[1, 1, 1, 1, 2, 2, 1]));
        assert_eq!(data.links()[0].patterns(TravelDirection::From), None);
        assert_eq!(data.links()[1].patterns(TravelDirection::To), None);
        assert!(!data.links()[1].is_potential_traffic_segment());
        assert_eq!(data.pattern(1).unwrap().max_speed(), 50);
    }
}
