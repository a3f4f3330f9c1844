use std::path::Path;

use fxhash::FxHashMap;
use tracing::{debug, info, warn};

use crate::{
    builders::graph_storage_builder::{GraphContext, GraphStorageBuilder},
    codec::ClampedValue,
    config::BuilderConfig,
    error::ExtensionError,
    extension_store::EdgeRecordStore,
    graph_edge::EdgeState,
    osm::way::Way,
    storage::{binary_file_path, read_bytes, write_bytes},
    types::{EdgeId, OsmWayId},
};

/// Byte written for edges whose way has no row, or for a column that could not be read
pub const UNKNOWN_VALUE: u8 = 0xFF;

const DEFAULT_MAX: u32 = 100;

/// Values are stored as hundredths
const VALUE_SCALE: f64 = 100.0;

/// Side data sets keyed by OSM way id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvIndexKind {
    Noise,
    Shadow,
    Green,
    Custom,
}

impl CsvIndexKind {
    pub fn name(&self) -> &'static str {
        match self {
            CsvIndexKind::Noise => "NoiseIndex",
            CsvIndexKind::Shadow => "ShadowIndex",
            CsvIndexKind::Green => "GreenIndex",
            CsvIndexKind::Custom => "CsvIndex",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            CsvIndexKind::Noise => "noise_index",
            CsvIndexKind::Shadow => "shadow_index",
            CsvIndexKind::Green => "green_index",
            CsvIndexKind::Custom => "csv_index",
        }
    }
}

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct CsvIndexStore {
    columns: Vec<String>,
    values: EdgeRecordStore,
}

impl CsvIndexStore {
    pub fn new(columns: Vec<String>) -> Self {
        let width = columns.len();
        CsvIndexStore {
            columns,
            values: EdgeRecordStore::new(width, UNKNOWN_VALUE),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of the first column, in hundredths
    pub fn value(&self, edge_id: EdgeId) -> Option<u8> {
        self.values.value(edge_id, 0)
    }

    pub fn column_value(&self, edge_id: EdgeId, column: &str) -> Option<u8> {
        let index = self.columns.iter().position(|name| name == column)?;
        self.values.value(edge_id, index)
    }

    pub fn save_to_file(&self, directory: &Path, file_name: &str) -> Result<(), ExtensionError> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|_| ExtensionError::Serialize(file_name.to_string()))?;
        write_bytes(&bytes[..], &binary_file_path(directory, file_name))
    }

    pub fn from_file(directory: &Path, file_name: &str) -> Result<Self, ExtensionError> {
        let bytes = read_bytes(&binary_file_path(directory, file_name))?;
        let store = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&bytes[..])
            .map_err(|_| ExtensionError::Deserialize(file_name.to_string()))?;
        info!("Deserialized {} from buffer", file_name);
        Ok(store)
    }
}

pub struct CsvIndexBuilder {
    kind: CsvIndexKind,
    config: BuilderConfig,
    way_values: FxHashMap<OsmWayId, Vec<u8>>,
    store: Option<CsvIndexStore>,
}

/// Column selection and encoding of one CSV file.
struct CsvLayout {
    indices: Vec<usize>,
    codec: ClampedValue,
}

impl CsvLayout {
    fn encode_row(&self, record: &csv::StringRecord) -> Option<(OsmWayId, Vec<u8>)> {
        let way_id = record.get(0)?.trim().parse::<OsmWayId>().ok()?;

        let values = self
            .indices
            .iter()
            .map(|index| {
                let value = record.get(*index)?.trim().parse::<f64>().ok()?;
                // max is validated to stay below UNKNOWN_VALUE
                Some(self.codec.encode(value) as u8)
            })
            .collect::<Option<Vec<u8>>>()?;

        Some((way_id, values))
    }
}

impl CsvIndexBuilder {
    pub fn new(kind: CsvIndexKind, config: BuilderConfig) -> Self {
        CsvIndexBuilder {
            kind,
            config,
            way_values: FxHashMap::default(),
            store: None,
        }
    }

    pub fn kind(&self) -> CsvIndexKind {
        self.kind
    }

    pub fn store(&self) -> Option<&CsvIndexStore> {
        self.store.as_ref()
    }

    fn layout(&self, headers: &csv::StringRecord) -> Result<(Vec<String>, Vec<usize>), ExtensionError> {
        let name = self.kind.name();

        let Some(columns) = self.config.get("columns") else {
            return Ok(match self.kind {
                CsvIndexKind::Custom => {
                    let names = headers.iter().skip(1).map(|header| header.trim().to_string()).collect();
                    (names, (1..headers.len()).collect())
                }
                _ => (vec![self.kind.file_name().to_string()], vec![1]),
            });
        };

        let mut names = Vec::new();
        let mut indices = Vec::new();
        for column in columns.split(',').map(str::trim).filter(|column| !column.is_empty()) {
            let index = headers
                .iter()
                .position(|header| header.trim() == column)
                .ok_or_else(|| ExtensionError::InvalidConfig {
                    builder: name.to_string(),
                    key: "columns".to_string(),
                    value: column.to_string(),
                })?;
            names.push(column.to_string());
            indices.push(index);
        }

        Ok((names, indices))
    }

    fn read_csv(&mut self, path: &str, max: u32) -> Result<Vec<String>, ExtensionError> {
        let csv_error = |source| ExtensionError::Csv {
            path: path.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();
        let (columns, indices) = self.layout(&headers)?;
        let layout = CsvLayout {
            indices,
            codec: ClampedValue::scaled(self.kind.name(), VALUE_SCALE, max),
        };

        let mut malformed = 0;
        for record in reader.records() {
            let parsed = record.ok().and_then(|record| layout.encode_row(&record));
            match parsed {
                Some((way_id, values)) => {
                    self.way_values.insert(way_id, values);
                }
                None => malformed += 1,
            }
        }

        if malformed > 0 {
            warn!("{}: skipped {} malformed rows in {}", self.kind.name(), malformed, path);
        }
        info!(
            "{}: read values for {} ways from {}",
            self.kind.name(),
            self.way_values.len(),
            path
        );

        Ok(columns)
    }
}

impl GraphStorageBuilder for CsvIndexBuilder {
    type Decision = Option<Vec<u8>>;

    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn init(&mut self, _context: &GraphContext) -> Result<(), ExtensionError> {
        let name = self.kind.name();
        if self.store.is_some() {
            return Err(ExtensionError::AlreadyInitialized(name));
        }

        let path = self.config.required(name, "filepath")?.to_string();
        let max = self.config.parse_or(name, "max", DEFAULT_MAX)?;
        if max >= u32::from(UNKNOWN_VALUE) {
            return Err(ExtensionError::InvalidConfig {
                builder: name.to_string(),
                key: "max".to_string(),
                value: max.to_string(),
            });
        }

        let columns = self.read_csv(&path, max)?;
        self.store = Some(CsvIndexStore::new(columns));
        Ok(())
    }

    fn process_way(&self, way: &Way) -> Option<Vec<u8>> {
        self.way_values.get(&way.id()).cloned()
    }

    fn process_edge(&mut self, way: &Way, values: &Option<Vec<u8>>, edge: &EdgeState) {
        let (Some(store), Some(values)) = (self.store.as_mut(), values) else {
            return;
        };

        if values.len() == store.values.width() {
            store.values.set(edge.id, values);
        } else {
            debug!("Ignoring values of way {} with a different column count", way.id());
        }
    }

    fn finish(&mut self) -> Result<(), ExtensionError> {
        self.way_values = FxHashMap::default();
        Ok(())
    }

    fn save(&self, directory: &Path) -> Result<(), ExtensionError> {
        self.store
            .as_ref()
            .ok_or(ExtensionError::NotInitialized(self.kind.name()))?
            .save_to_file(directory, self.kind.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{edge_state, empty_context, write_temp_file};

    #[test]
    fn test_noise_values_are_scaled_and_clamped() {
        let path = write_temp_file(
            "noise.csv",
            "id,value\n10,0.5\n11,1.7\nnot-a-way,0.3\n12,loud\n13,0.25\n",
        );
        let mut builder = CsvIndexBuilder::new(
            CsvIndexKind::Noise,
            BuilderConfig::new().with("filepath", path.to_str().unwrap()),
        );
        let (graph, output) = empty_context();
        builder.init(&GraphContext::new(&graph, &output)).unwrap();

        for (way_id, edge_id) in [(10, 0), (11, 1), (12, 2), (13, 3)] {
            let way = Way::new(way_id, [("highway", "primary")], vec![1, 2]);
            let decision = builder.process_way(&way);
            builder.process_edge(&way, &decision, &edge_state(edge_id));
        }

        let store = builder.store().unwrap();
        assert_eq!(store.value(0), Some(50));
        assert_eq!(store.value(1), Some(100));
        assert_eq!(store.value(2), None);
        assert_eq!(store.value(3), Some(25));
    }

    #[test]
    fn test_custom_columns_are_selected_by_name() {
        let path = write_temp_file("custom.csv", "osm_id,shade,trees,benches\n20,0.1,0.2,0.3\n");
        let mut builder = CsvIndexBuilder::new(
            CsvIndexKind::Custom,
            BuilderConfig::new()
                .with("filepath", path.to_str().unwrap())
                .with("columns", "benches, shade")
                .with("max", "200"),
        );
        let (graph, output) = empty_context();
        builder.init(&GraphContext::new(&graph, &output)).unwrap();

        let way = Way::new(20, [("highway", "footway")], vec![1, 2]);
        let decision = builder.process_way(&way);
        builder.process_edge(&way, &decision, &edge_state(0));

        let store = builder.store().unwrap();
        assert_eq!(store.columns(), &["benches".to_string(), "shade".to_string()]);
        assert_eq!(store.column_value(0, "benches"), Some(30));
        assert_eq!(store.column_value(0, "shade"), Some(10));
        assert_eq!(store.column_value(0, "trees"), None);
    }

    #[test]
    fn test_missing_filepath_is_fatal() {
        let mut builder = CsvIndexBuilder::new(CsvIndexKind::Green, BuilderConfig::new());
        let (graph, output) = empty_context();

        let error = builder.init(&GraphContext::new(&graph, &output)).unwrap_err();
        assert_eq!(
            error.to_string(),
            "missing configuration parameter filepath for GreenIndex"
        );
    }

    #[test]
    fn test_max_must_leave_room_for_unknown() {
        let path = write_temp_file("shadow.csv", "id,value\n");
        let mut builder = CsvIndexBuilder::new(
            CsvIndexKind::Shadow,
            BuilderConfig::new()
                .with("filepath", path.to_str().unwrap())
                .with("max", "255"),
        );
        let (graph, output) = empty_context();

        assert!(matches!(
            builder.init(&GraphContext::new(&graph, &output)),
            Err(ExtensionError::InvalidConfig { .. })
        ));
    }
}
