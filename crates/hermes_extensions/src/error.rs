use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("graph storage builder {0} has already been initialized")]
    AlreadyInitialized(&'static str),
    #[error("graph storage builder {0} has not been initialized")]
    NotInitialized(&'static str),
    #[error("missing configuration parameter {key} for {builder}")]
    MissingConfig { builder: String, key: String },
    #[error("invalid value {value:?} for configuration parameter {key} of {builder}")]
    InvalidConfig {
        builder: String,
        key: String,
        value: String,
    },
    #[error("unknown graph storage builder {0}")]
    UnknownBuilder(String),
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse csv file {path}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to parse geojson file {path}")]
    GeoJson {
        path: String,
        #[source]
        source: geojson::Error,
    },
    #[error("failed to read osm file")]
    Osm(#[from] osmpbfreader::Error),
    #[error("failed to serialize {0}")]
    Serialize(String),
    #[error("failed to deserialize {0}")]
    Deserialize(String),
    #[error("invalid timestamp or time zone")]
    Time(#[from] jiff::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("{field} value {value} exceeds the maximum of {max}")]
    ValueTooLarge {
        field: &'static str,
        value: u32,
        max: u32,
    },
}
