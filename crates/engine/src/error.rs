// In crates/engine/src/error.rs

use thiserror::Error;

/// Structural failures that abort a cycle. Advisor problems during a cycle
/// never end up here; only advisor construction does.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Indicator error: {0}")]
    Features(#[from] features::Error),

    #[error("Signal agent error: {0}")]
    Strategy(#[from] strategies::Error),

    #[error("Risk error: {0}")]
    Risk(#[from] risk::Error),

    #[error("Execution error: {0}")]
    Execution(#[from] execution::Error),

    #[error("Advisor setup failed: {0}")]
    Advisor(#[from] advisor::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
