use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum BarError {
    #[error("config error: {0}")]
    Config(String),

    #[error("system error: {0}")]
    System(String),

    #[error("widget error: {0}")]
    Widget(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("restart failed: {0}")]
    Restart(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BarError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BarError> = std::result::Result<T, E>;
