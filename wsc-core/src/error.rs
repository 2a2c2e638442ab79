use thiserror::Error;

/// Errors raised while loading or validating the waterbody catalogue and
/// runtime settings. These are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed waterbody configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid geometry for waterbody '{id}': {reason}")]
    InvalidGeometry { id: String, reason: String },

    #[error("Duplicate waterbody id: {0}")]
    DuplicateId(String),

    #[error("Waterbody configuration is empty")]
    Empty,

    #[error("Unknown waterbody id: {0}")]
    UnknownWaterbody(String),

    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// A measurement that cannot be stored.
#[derive(Error, Debug, PartialEq)]
pub enum MeasurementError {
    #[error("waterbody id is empty")]
    EmptyWaterbodyId,

    #[error("surface area must be finite and non-negative, got {0}")]
    InvalidArea(f64),

    #[error("cloud cover must be within 0..=100, got {0}")]
    InvalidCloudCover(f64),
}
