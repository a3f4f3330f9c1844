use std::path::Path;

use tracing::{debug, info};

use crate::{
    builders::{
        csv_index::{CsvIndexBuilder, CsvIndexKind},
        graph_storage_builder::{DynGraphStorageBuilder, GraphContext, GraphStorageBuilder},
        road_access_restrictions::RoadAccessRestrictionsBuilder,
        street_crossing::StreetCrossingBuilder,
        way_category::WayCategoryBuilder,
        way_surface::WaySurfaceTypeBuilder,
    },
    config::{BuilderConfig, ExtensionsConfig},
    error::ExtensionError,
    graph_edge::EdgeState,
    osm::way::Way,
    traffic::here_traffic_builder::HereTrafficBuilder,
    wheelchair::wheelchair_builder::WheelchairBuilder,
};

/// The builders of one graph construction run, called in registration order.
#[derive(Default)]
pub struct GraphStorageBuilderRegistry {
    builders: Vec<Box<dyn DynGraphStorageBuilder>>,
}

fn create_builder(
    name: &str,
    config: BuilderConfig,
) -> Result<Box<dyn DynGraphStorageBuilder>, ExtensionError> {
    let builder: Box<dyn DynGraphStorageBuilder> = match name {
        RoadAccessRestrictionsBuilder::NAME => Box::new(RoadAccessRestrictionsBuilder::new(config)),
        WayCategoryBuilder::NAME => Box::new(WayCategoryBuilder::new(config)),
        WaySurfaceTypeBuilder::NAME => Box::new(WaySurfaceTypeBuilder::new(config)),
        StreetCrossingBuilder::NAME => Box::new(StreetCrossingBuilder::new(config)),
        WheelchairBuilder::NAME => Box::new(WheelchairBuilder::new(config)),
        HereTrafficBuilder::NAME => Box::new(HereTrafficBuilder::new(config)),
        "NoiseIndex" => Box::new(CsvIndexBuilder::new(CsvIndexKind::Noise, config)),
        "ShadowIndex" => Box::new(CsvIndexBuilder::new(CsvIndexKind::Shadow, config)),
        "GreenIndex" => Box::new(CsvIndexBuilder::new(CsvIndexKind::Green, config)),
        "CsvIndex" => Box::new(CsvIndexBuilder::new(CsvIndexKind::Custom, config)),
        _ => return Err(ExtensionError::UnknownBuilder(name.to_string())),
    };

    Ok(builder)
}

impl GraphStorageBuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExtensionsConfig) -> Result<Self, ExtensionError> {
        let mut registry = GraphStorageBuilderRegistry::new();

        for builder in &config.builders {
            registry
                .builders
                .push(create_builder(&builder.name, builder.parameters.clone())?);
        }

        info!("Registered graph storage builders: {:?}", registry.names());
        Ok(registry)
    }

    pub fn register<B: GraphStorageBuilder>(&mut self, builder: B) {
        self.builders.push(Box::new(builder));
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.builders.iter().map(|builder| builder.name()).collect()
    }

    pub fn init(&mut self, context: &GraphContext) -> Result<(), ExtensionError> {
        for builder in &mut self.builders {
            debug!("Initializing {}", builder.name());
            builder.init(context)?;
        }
        Ok(())
    }

    /// Runs the way phase then the edge phase of every builder for one way.
    pub fn process_way_edges(&mut self, way: &Way, edges: &[EdgeState]) {
        for builder in &mut self.builders {
            builder.process_way_edges(way, edges);
        }
    }

    pub fn finish(&mut self) -> Result<(), ExtensionError> {
        for builder in &mut self.builders {
            builder.finish()?;
        }
        Ok(())
    }

    pub fn post_process(&mut self, context: &GraphContext) -> Result<(), ExtensionError> {
        for builder in &mut self.builders {
            builder.post_process(context)?;
        }
        Ok(())
    }

    pub fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        for builder in &self.builders {
            builder.save(directory)?;
            info!("Saved {} to {}", builder.name(), directory.display());
        }
        Ok(())
    }

    /// First registered builder of type `B`.
    pub fn builder<B: GraphStorageBuilder>(&self) -> Option<&B> {
        self.builders
            .iter()
            .find_map(|builder| builder.as_any().downcast_ref::<B>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builders::way_category::WayCategory,
        codec::MaskFlag,
        test_utils::{edge_state, empty_context},
    };

    #[test]
    fn test_registry_from_config() {
        let config = ExtensionsConfig::from_json(
            r#"{ "builders": [
                { "name": "WayCategory" },
                { "name": "Wheelchair" },
                { "name": "RoadAccessRestrictions", "parameters": { "profile": "driving-car" } }
            ] }"#,
        )
        .unwrap();

        let registry = GraphStorageBuilderRegistry::from_config(&config).unwrap();

        assert_eq!(
            registry.names(),
            vec!["WayCategory", "Wheelchair", "RoadAccessRestrictions"]
        );
        assert!(registry.builder::<WheelchairBuilder>().is_some());
        assert!(registry.builder::<HereTrafficBuilder>().is_none());
    }

    #[test]
    fn test_unknown_builder_is_rejected() {
        let config =
            ExtensionsConfig::from_json(r#"{ "builders": [{ "name": "Elevation" }] }"#).unwrap();

        assert!(matches!(
            GraphStorageBuilderRegistry::from_config(&config),
            Err(ExtensionError::UnknownBuilder(name)) if name == "Elevation"
        ));
    }

    #[test]
    fn test_edges_reach_every_builder() {
        let (graph, directory) = empty_context();
        let context = GraphContext::new(&graph, &directory);

        let mut registry = GraphStorageBuilderRegistry::new();
        registry.register(WayCategoryBuilder::new(BuilderConfig::new()));
        registry.register(StreetCrossingBuilder::new(BuilderConfig::new()));
        registry.init(&context).unwrap();

        let way = Way::new(7, [("highway", "motorway")], vec![1, 2]);
        registry.process_way_edges(&way, &[edge_state(0), edge_state(1)]);
        registry.finish().unwrap();
        registry.post_process(&context).unwrap();

        let store = registry
            .builder::<WayCategoryBuilder>()
            .and_then(|builder| builder.store())
            .unwrap();
        for edge_id in 0..2 {
            assert_eq!(
                store.categories(edge_id).unwrap().bits(),
                WayCategory::Highways.bit()
            );
        }
    }

    #[test]
    fn test_second_init_fails() {
        let (graph, directory) = empty_context();
        let context = GraphContext::new(&graph, &directory);

        let mut registry = GraphStorageBuilderRegistry::new();
        registry.register(WayCategoryBuilder::new(BuilderConfig::new()));
        registry.init(&context).unwrap();

        assert!(matches!(
            registry.init(&context),
            Err(ExtensionError::AlreadyInitialized("WayCategory"))
        ));
    }
}
