//! Error types for mapscout

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {context}: {source}")]
    DecodeFailure {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("out of bounds: offset {offset} length {length} exceeds image size {size}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },

    #[error("malformed template: {0}")]
    MalformedTemplate(String),

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Exit code for the CLI driver, per the external-interfaces contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::IoFailure { .. } => 2,
            Error::DecodeFailure { .. } => 3,
            Error::OutOfBounds { .. } => 3,
            Error::MalformedTemplate(_) => 3,
            Error::WriteFailure { .. } => 4,
        }
    }
}
