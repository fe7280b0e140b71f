//! Error types for the Kopi ordering engine

use thiserror::Error;

/// Result type alias for Kopi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Kopi ordering engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Menu catalog error
    #[error("menu error: {0}")]
    Menu(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Order mutation rejected
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Voice capture failed
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Order history store failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Order mutations the catalog or the current order cannot satisfy
///
/// Always shown to the user; the order is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} is not on the menu")]
    UnknownItem(String),

    #[error("{0} is not an available add-on")]
    UnknownAddOn(String),

    #[error("please choose hot or cold for {0}")]
    TemperatureRequired(String),

    #[error("there is no order line at position {0}")]
    IndexOutOfRange(usize),

    #[error("that order line no longer exists")]
    SlotNotFound,
}

/// Reasons a listen-and-recognize cycle produced no transcript
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no speech started before the listening timeout")]
    Timeout,

    #[error("no speech was detected")]
    NoSpeech,

    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("sorry, I couldn't understand that")]
    Unintelligible,
}

/// Speech synthesis failure; logged and otherwise ignored
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("synthesis service error: {0}")]
    Service(String),
}

/// Order history store failure
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("order history unavailable: {0}")]
    Unavailable(String),

    #[error("stored order is corrupt: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<r2d2::Error> for PersistenceError {
    fn from(e: r2d2::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

impl From<Error> for SynthesisError {
    fn from(e: Error) -> Self {
        match e {
            Error::Audio(msg) => Self::Output(msg),
            other => Self::Service(other.to_string()),
        }
    }
}
