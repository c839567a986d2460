//! Error types for the digest pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid target date: {input:?} (want YYYY-MM-DD)")]
    InvalidDate { input: String },

    #[error("digest generator failed: {message}")]
    GeneratorFailed { message: String },

    #[error("send failed: {backend} - {message}")]
    SendFailed { backend: String, message: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_date(input: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
        }
    }

    pub fn generator_failed(message: impl Into<String>) -> Self {
        Self::GeneratorFailed {
            message: message.into(),
        }
    }

    pub fn send_failed(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SendFailed {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
