//! Error types.
//!
//! - `ModelError` is returned by the library (grid loading, smoothing, evaluation).
//! - `AppError` is what the `one-datum` binary reports: a message plus the process
//!   exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or evaluating an uncertainty model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read uncertainty grid '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FITS error in '{}': {source}", path.display())]
    Fits {
        path: PathBuf,
        #[source]
        source: fitsio::errors::Error,
    },

    #[error("invalid FITS file '{}': {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("missing required header key {0}")]
    MissingKey(String),

    #[error("invalid header value for {key}: {message}")]
    InvalidHeader { key: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{axis} value {value} is outside the grid range [{min}, {max}]")]
    OutOfBounds {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ModelError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_header(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// True for query-time domain errors (as opposed to load/config failures).
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let exit_code = match err {
            ModelError::OutOfBounds { .. } => 3,
            _ => 2,
        };
        Self::new(exit_code, err.to_string())
    }
}
