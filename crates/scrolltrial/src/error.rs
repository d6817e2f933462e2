#![forbid(unsafe_code)]

use thiserror::Error;

use scrolltrial_core::GeometryError;
use scrolltrial_runtime::{ConfigError, LogError, TrialError};

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the facade and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("trial error: {0}")]
    Trial(#[from] TrialError),

    #[error("logging error: {0}")]
    Log(#[from] LogError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl Error {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            Self::Config(_) => 3,
            Self::Geometry(_) | Self::Trial(_) => 4,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
