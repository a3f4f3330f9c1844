use std::{any::Any, path::Path};

use crate::{
    error::ExtensionError, graph::GraphAccess, graph_edge::EdgeState, osm::way::Way,
};

/// What a builder can see of the graph under construction.
pub struct GraphContext<'a> {
    pub graph: &'a (dyn GraphAccess + Sync),
    pub output_dir: &'a Path,
}

impl<'a> GraphContext<'a> {
    pub fn new(graph: &'a (dyn GraphAccess + Sync), output_dir: &'a Path) -> Self {
        GraphContext { graph, output_dir }
    }
}

/// Two phase construction of an edge extension store.
///
/// `process_way` runs once per way and derives a decision from the way alone, the decision is then
/// handed to `process_edge` for every edge the way was split into. `post_process` runs once the
/// whole graph is known.
pub trait GraphStorageBuilder: 'static {
    type Decision;

    fn name(&self) -> &'static str;

    /// Allocates the store. Calling it a second time on the same builder fails.
    fn init(&mut self, context: &GraphContext) -> Result<(), ExtensionError>;

    fn process_way(&self, way: &Way) -> Self::Decision;

    fn process_edge(&mut self, way: &Way, decision: &Self::Decision, edge: &EdgeState);

    fn finish(&mut self) -> Result<(), ExtensionError> {
        Ok(())
    }

    fn post_process(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        Ok(())
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError>;
}

/// Object safe view of a [`GraphStorageBuilder`], used by the registry to hold builders with
/// different decision types.
pub trait DynGraphStorageBuilder {
    fn name(&self) -> &'static str;

    fn init(&mut self, context: &GraphContext) -> Result<(), ExtensionError>;

    fn process_way_edges(&mut self, way: &Way, edges: &[EdgeState]);

    fn finish(&mut self) -> Result<(), ExtensionError>;

    fn post_process(&mut self, context: &GraphContext) -> Result<(), ExtensionError>;

    fn save(&self, directory: &Path) -> Result<(), ExtensionError>;

    fn as_any(&self) -> &dyn Any;
}

impl<B: GraphStorageBuilder> DynGraphStorageBuilder for B {
    fn name(&self) -> &'static str {
        GraphStorageBuilder::name(self)
    }

    fn init(&mut self, context: &GraphContext) -> Result<(), ExtensionError> {
        GraphStorageBuilder::init(self, context)
    }

    fn process_way_edges(&mut self, way: &Way, edges: &[EdgeState]) {
        let decision = self.process_way(way);
        for edge in edges {
            self.process_edge(way, &decision, edge);
        }
    }

    fn finish(&mut self) -> Result<(), ExtensionError> {
        GraphStorageBuilder::finish(self)
    }

    fn post_process(&mut self, context: &GraphContext) -> Result<(), ExtensionError> {
        GraphStorageBuilder::post_process(self, context)
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        GraphStorageBuilder::save(self, directory)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
