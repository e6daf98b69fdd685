use thiserror::Error;

/// Errors raised when loading or applying render configuration.
///
/// These are the only hard failures in the pipeline; everything else degrades.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("LOD hidden threshold ({hidden}) must be below the simple threshold ({simple})")]
    LodThresholdOrder { hidden: f64, simple: f64 },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("Malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
