//! Error types for spardha-ctl

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// spardha-ctl error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported device type in config
    #[error("Unsupported device type: {0}")]
    UnsupportedDevice(String),

    /// Routine name not present in the registry
    #[error("Unknown routine: {0}")]
    UnknownRoutine(String),

    /// A routine has already been selected this match
    #[error("A routine has already been selected")]
    RoutineBusy,

    /// Chassis command failed
    #[error("Chassis error: {0}")]
    Chassis(String),

    /// Sensor read failed or device absent
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(&'static str),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}
