//! Error types for the keeper service

use rollover_core::StrategyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type KeeperResult<T> = Result<T, KeeperError>;

impl KeeperError {
    /// Guard-rail refusals from the strategy, safe to retry on a later tick
    pub fn is_guard_rail(&self) -> bool {
        matches!(self, KeeperError::Strategy(err) if err.is_guard_rail())
    }
}

impl From<serde_json::Error> for KeeperError {
    fn from(err: serde_json::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for KeeperError {
    fn from(err: toml::de::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for KeeperError {
    fn from(err: toml::ser::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}
