// In crates/core-types/src/error.rs

use thiserror::Error;

use crate::types::Side;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown {kind} value: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Take-profit {take_profit} is not beyond entry {entry_price} for a {side} trade")]
    InvalidTakeProfit {
        side: Side,
        entry_price: f64,
        take_profit: f64,
    },

    #[error("Stop-loss {stop_loss} is not on the losing side of entry {entry_price} for a {side} trade")]
    InvalidStopLoss {
        side: Side,
        entry_price: f64,
        stop_loss: f64,
    },

    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid order request: {0}")]
    InvalidOrder(String),
}

pub type Result<T> = std::result::Result<T, Error>;
