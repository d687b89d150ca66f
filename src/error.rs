//! Crate-wide error types.

use thiserror::Error;

pub type PprofResult<T> = Result<T, PprofError>;

#[derive(Debug, Error)]
pub enum PprofError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("profiling engine error: {0}")]
    Engine(String),
}

impl From<regex::Error> for PprofError {
    fn from(value: regex::Error) -> Self {
        Self::InvalidArgument(format!("invalid pattern: {value}"))
    }
}
