use std::str::FromStr;

use fxhash::FxHashMap;
use serde::Deserialize;

use crate::error::ExtensionError;

/// Flat key/value parameters of a single graph storage builder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct BuilderConfig {
    parameters: FxHashMap<String, String>,
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(|value| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    pub fn required(&self, builder: &str, key: &str) -> Result<&str, ExtensionError> {
        self.get(key).ok_or_else(|| ExtensionError::MissingConfig {
            builder: builder.to_string(),
            key: key.to_string(),
        })
    }

    /// Same lenient parsing as `Boolean.parseBoolean`: anything but "true" is false.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map_or(default, |value| value.trim().eq_ignore_ascii_case("true"))
    }

    pub fn parse_or<T: FromStr>(
        &self,
        builder: &str,
        key: &str,
        default: T,
    ) -> Result<T, ExtensionError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|_| ExtensionError::InvalidConfig {
                    builder: builder.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                }),
        }
    }
}

/// Builder name to parameters, in the order the builders should run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtensionsConfig {
    #[serde(default)]
    pub builders: Vec<NamedBuilderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedBuilderConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: BuilderConfig,
}

impl ExtensionsConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_key_names_the_key() {
        let config = BuilderConfig::new().with("enabled", "true");
        let error = config.required("HereTraffic", "streets").unwrap_err();

        assert_eq!(
            error.to_string(),
            "missing configuration parameter streets for HereTraffic"
        );
    }

    #[test]
    fn test_bool_parsing_is_lenient() {
        let config = BuilderConfig::new()
            .with("a", "TRUE")
            .with("b", "yes")
            .with("c", "false");

        assert!(config.bool_or("a", false));
        assert!(!config.bool_or("b", true));
        assert!(!config.bool_or("c", true));
        assert!(config.bool_or("missing", true));
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        let config = BuilderConfig::new().with("radius", "wide");
        assert!(config.parse_or("HereTraffic", "radius", 200_u32).is_err());
        assert_eq!(
            config.parse_or("HereTraffic", "missing", 200_u32).unwrap(),
            200
        );
    }

    #[test]
    fn test_extensions_config_from_json() {
        let config = ExtensionsConfig::from_json(
            r#"{
                "builders": [
                    { "name": "WayCategory" },
                    { "name": "Wheelchair", "parameters": { "KerbsOnCrossings": "true" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.builders.len(), 2);
        assert_eq!(config.builders[0].name, "WayCategory");
        assert!(config.builders[1].parameters.bool_or("KerbsOnCrossings", false));
    }
}
