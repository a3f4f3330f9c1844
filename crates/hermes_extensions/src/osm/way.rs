use fxhash::FxHashMap;

use crate::{
    osm::tag_resolver::{Tags, normalize_tags},
    types::{OsmNodeId, OsmWayId},
};

#[derive(Debug, Clone, Default)]
pub struct Way {
    id: OsmWayId,
    tags: Tags,
    nodes: Vec<OsmNodeId>,
    node_tags: FxHashMap<OsmNodeId, Tags>,
}

impl Way {
    pub fn new<'a, I>(id: OsmWayId, tags: I, nodes: Vec<OsmNodeId>) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Way {
            id,
            tags: normalize_tags(tags),
            nodes,
            node_tags: FxHashMap::default(),
        }
    }

    pub fn with_node_tags<'a, I>(mut self, node_id: OsmNodeId, tags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.set_node_tags(node_id, normalize_tags(tags));
        self
    }

    pub(crate) fn set_node_tags(&mut self, node_id: OsmNodeId, tags: Tags) {
        if !tags.is_empty() {
            self.node_tags.insert(node_id, tags);
        }
    }

    pub fn id(&self) -> OsmWayId {
        self.id
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn nodes(&self) -> &[OsmNodeId] {
        &self.nodes
    }

    pub fn node_tags(&self, node_id: OsmNodeId) -> Option<&Tags> {
        self.node_tags.get(&node_id)
    }

    /// Node tag overlays in way order
    pub fn node_tags_iter(&self) -> impl Iterator<Item = (OsmNodeId, &Tags)> {
        self.nodes
            .iter()
            .filter_map(|node_id| self.node_tags(*node_id).map(|tags| (*node_id, tags)))
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|value| value.as_str())
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn has_tag_value(&self, key: &str, value: &str) -> bool {
        self.tag(key) == Some(value)
    }

    pub fn has_tag_in(&self, key: &str, values: &[&str]) -> bool {
        self.tag(key).is_some_and(|value| values.contains(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_way_keys_are_normalized() {
        let way = Way::new(7, [("Sidewalk.Left.Width", "2")], vec![1, 2]);

        assert_eq!(way.tag("sidewalk:left:width"), Some("2"));
        assert!(way.has_tag("sidewalk:left:width"));
    }

    #[test]
    fn test_node_tags_iter_follows_way_order() {
        let way = Way::new(7, [("highway", "footway")], vec![3, 2, 1])
            .with_node_tags(1, [("kerb", "raised")])
            .with_node_tags(3, [("kerb", "flush")])
            .with_node_tags(2, std::iter::empty());

        let nodes: Vec<_> = way.node_tags_iter().map(|(node, _)| node).collect();
        assert_eq!(nodes, vec![3, 1]);
    }
}
