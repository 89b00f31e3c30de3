// In crates/features/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid indicator parameter `{name}`: must be a positive integer, got {value}")]
    InvalidParameter { name: &'static str, value: usize },

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

pub type Result<T> = std::result::Result<T, Error>;
