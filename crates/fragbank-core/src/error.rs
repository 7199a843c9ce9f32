use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    // A handle keeps one bit for the pool selector, so ids are capped at 31 bits.
    #[error("internal id {id} of the {pool} pool does not fit in a 32-bit handle")]
    IdSpaceExhausted { pool: &'static str, id: u64 },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
