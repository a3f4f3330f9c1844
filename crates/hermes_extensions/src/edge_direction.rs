use crate::types::NodeId;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum EdgeDirection {
    Forward,
    Backward,
}

impl EdgeDirection {
    pub fn opposite(&self) -> Self {
        match self {
            EdgeDirection::Forward => EdgeDirection::Backward,
            EdgeDirection::Backward => EdgeDirection::Forward,
        }
    }

    /// Direction of travel keyed on node ordering, independent of how the edge is stored.
    pub fn of_traversal(base_node: NodeId, adj_node: NodeId) -> Self {
        if base_node <= adj_node {
            EdgeDirection::Forward
        } else {
            EdgeDirection::Backward
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_of_traversal() {
        assert_eq!(EdgeDirection::of_traversal(3, 7), EdgeDirection::Forward);
        assert_eq!(EdgeDirection::of_traversal(7, 3), EdgeDirection::Backward);
        assert_eq!(EdgeDirection::of_traversal(4, 4), EdgeDirection::Forward);
        assert_eq!(
            EdgeDirection::of_traversal(7, 3).opposite(),
            EdgeDirection::Forward
        );
    }
}
