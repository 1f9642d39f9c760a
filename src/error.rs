use thiserror::Error;

/// Failure of a collaborator store that is not a typed commit outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store error: {0}")]
    Internal(String),
}

/// Run-level failures. Anything else ends up in the report.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no time slots exist; create time slots before generating")]
    NoTimeSlots,
    #[error("no active rooms exist; create rooms before generating")]
    NoActiveRooms,
    #[error("catalog failed: {0}")]
    Catalog(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecomposeError {
    #[error("default hour type '{0}' does not exist in the catalog")]
    MissingDefaultHourType(String),
}

/// Caller input rejected before the engine runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("programId must be a positive integer")]
    InvalidProgram,
    #[error("maxPerClass must be an integer between 1 and {max}")]
    InvalidCap { max: u32 },
    #[error("malformed request body: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("cannot read catalog file '{path}': {source}")]
    CatalogRead {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse catalog file '{path}': {source}")]
    CatalogParse {
        path: String,
        source: serde_json::Error,
    },
}
