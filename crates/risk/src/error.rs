// In crates/risk/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid risk parameter: {0}")]
    InvalidParameter(String),

    #[error("Stop loss {stop_loss} leaves no risk per unit against entry {entry_price}")]
    InvalidStop { entry_price: f64, stop_loss: f64 },

    #[error("Signal has no side")]
    MissingSide,

    #[error("Signal has no entry price")]
    MissingPrice,
}

pub type Result<T> = std::result::Result<T, Error>;
