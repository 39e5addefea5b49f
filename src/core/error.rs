//! Error kinds shared by the ingester, the stores and the query service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The source document could not be retrieved.
    #[error("Failed to fetch rates from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The source document or a stored value does not have the expected shape.
    #[error("Failed to parse {0}")]
    Parse(String),

    /// A lookup, write or scan against the rate store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl From<fjall::Error> for Error {
    fn from(err: fjall::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(format!("record codec: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
