// In crates/advisor/src/error.rs

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Advisor did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Advisor unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed advisor response: {0}")]
    Malformed(String),

    #[error("Advisor request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
