use std::collections::BTreeMap;

use crate::osm::way::Way;

pub type Tags = BTreeMap<String, String>;

/// Unifies key spelling: `.` separators become `:` and keys are lowercased.
pub fn normalize_key(key: &str) -> String {
    key.trim().replace('.', ":").to_lowercase()
}

pub fn normalize_tags<'a, I>(tags: I) -> Tags
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(key, value)| (normalize_key(key), value.trim().to_string()))
        .collect()
}

/// Way tags with the tags of its nodes merged on top.
///
/// Nodes are visited in way order, so when two nodes carry the same key the last one wins,
/// and a node tag always overrides the way tag with the same key.
pub fn merge_node_tags(way: &Way) -> Tags {
    let mut merged = way.tags().clone();

    for node_id in way.nodes() {
        if let Some(node_tags) = way.node_tags(*node_id) {
            for (key, value) in node_tags {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    merged
}

/// Splits a multi value tag such as `yes;no`.
pub fn split_values(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(';')
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Sidewalk.Left.Surface"), "sidewalk:left:surface");
        assert_eq!(normalize_key("kerb:height"), "kerb:height");
    }

    #[test]
    fn test_node_tags_override_way_tags() {
        let way = Way::new(1, [("access", "yes"), ("highway", "residential")], vec![10, 11, 12])
            .with_node_tags(11, [("access", "private")])
            .with_node_tags(12, [("barrier", "gate")]);

        let merged = merge_node_tags(&way);

        assert_eq!(merged.get("access").map(String::as_str), Some("private"));
        assert_eq!(merged.get("barrier").map(String::as_str), Some("gate"));
        assert_eq!(merged.get("highway").map(String::as_str), Some("residential"));
    }

    #[test]
    fn test_split_values() {
        assert_eq!(split_values("yes; no;;").collect::<Vec<_>>(), vec!["yes", "no"]);
    }
}
