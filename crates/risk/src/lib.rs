// In crates/risk/src/lib.rs

pub mod agent;
pub mod error;
pub mod manager;
pub mod types;

// Re-export public types
pub use agent::RiskAgent;
pub use error::{Error, Result};
pub use manager::RiskManager;
pub use types::{PortfolioRisk, PositionSizing, RiskAssessment, RiskParameters, RiskReport};
