use thiserror::Error;

use super::config::ConfigError;
use crate::core::sasa::SasaError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Chain '{0}' not found in structure")]
    ChainNotFound(char),

    #[error("Interface requires two distinct chains, got '{0}' twice")]
    InvalidChainPair(char),

    #[error("Surface area calculation failed: {source}")]
    Sasa {
        #[from]
        source: SasaError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
