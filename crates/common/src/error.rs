//! Shared error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A channel endpoint was closed while the other side still needed it.
    #[error("Channel error: {0}")]
    Channel(String),

    /// Bad configuration (file contents or CLI arguments).
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
