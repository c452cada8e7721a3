//! Error handling and custom error types
//!
//! Provides unified error handling across the extraction pipeline using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required request field is missing or the body has the wrong shape.
    #[error("{0}")]
    Validation(String),

    /// Fetching, decoding or reading the input content failed.
    #[error("{0}")]
    Acquisition(String),

    /// The generative model call failed or was rejected.
    #[error("{0}")]
    ModelInvocation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by the caller's request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
