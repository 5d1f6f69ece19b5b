use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------
//
// Configuration and physical-model errors are fatal for a scenario; they are
// caught at the run boundary (sim::runner) and reported as a failed run.
// Missing optional data never surfaces here — loaders degrade to simpler
// models and log a warning instead.

#[derive(Debug, Error)]
pub enum SimError {
    /// Missing required key, invalid enumerated value, or unreadable
    /// configuration file. Carries the offending key/file path.
    #[error("configuration error at `{path}`: {message}")]
    Config { path: String, message: String },

    /// The standard-atmosphere model is undefined above the stratosphere.
    /// The stage that climbed past it cannot be simulated further.
    #[error("atmosphere is not defined above 32000 m (geopotential height {height:.1} m)")]
    AtmosphereOutOfRange { height: f64 },

    /// Launch site name not present in the map table.
    #[error("unknown launch site `{0}`")]
    UnknownPlace(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed table: {0}")]
    Table(#[from] csv::Error),
}

impl SimError {
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        SimError::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
