//! Error types at the library seams.

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the analysis service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Transport(String),

    #[error("{context} (HTTP {status})")]
    Status { context: &'static str, status: u16 },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e.to_string())
    }
}

/// Why an analyze or export submission did not complete.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Select a video file first.")]
    NoFileSelected,

    #[error("another request is already in flight")]
    Busy,

    #[error("could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not save {}: {source}", path.display())]
    SaveCsv {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("unknown setting: {0}")]
    UnknownField(String),

    #[error("{field} expects a {expected} value")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field}: '{input}' is not a number")]
    InvalidNumber { field: &'static str, input: String },
}
