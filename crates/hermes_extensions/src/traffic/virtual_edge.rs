use crate::{
    graph::GraphAccess,
    query_graph::QueryGraph,
    types::{EdgeId, NodeId},
};

/// A traversal expressed on the base graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEdge {
    pub edge_id: EdgeId,
    pub base_node: NodeId,
    pub adj_node: NodeId,
}

/// Maps the traversal of a query graph edge from `base_node` to `adj_node` onto the base edge it
/// was cut from. Virtual pieces keep the orientation of their original edge, so the traversal
/// direction carries over. `None` when the nodes are not the ends of the edge.
pub fn resolve_virtual_edge<G: GraphAccess + ?Sized>(
    query_graph: &QueryGraph<G>,
    edge_id: EdgeId,
    base_node: NodeId,
    adj_node: NodeId,
) -> Option<ResolvedEdge> {
    let edge = query_graph.edge(edge_id);
    let along = edge.start_node() == base_node && edge.end_node() == adj_node;
    let against = edge.end_node() == base_node && edge.start_node() == adj_node;

    if !along && !against {
        return None;
    }

    if !query_graph.is_virtual_edge(edge_id) {
        return Some(ResolvedEdge {
            edge_id,
            base_node,
            adj_node,
        });
    }

    let original_id = query_graph.original_edge(edge_id);
    let original = query_graph.base_graph().edge(original_id);

    let (base_node, adj_node) = if along {
        (original.start_node(), original.end_node())
    } else {
        (original.end_node(), original.start_node())
    };

    Some(ResolvedEdge {
        edge_id: original_id,
        base_node,
        adj_node,
    })
}
