// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Signal has no trade side")]
    MissingSide,

    #[error("No entry price: the signal has none and no usable quote was supplied")]
    MissingPrice,

    #[error("Trade rejected: {0}")]
    InvalidTrade(#[from] core_types::Error),

    #[error("Risk error: {0}")]
    Risk(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
