// In crates/execution/src/lib.rs

//! Converts entry signals into priced, sized and bracketed trade plans and
//! reports on them. Nothing in here talks to a broker.

pub mod agent;
pub mod error;
pub mod planner;
pub mod types;

// Re-export public types
pub use agent::ExecutionAgent;
pub use error::{Error, Result};
pub use planner::ExecutionPlanner;
pub use types::{ExecutionPlan, ExecutionReport, ExecutionSettings, PENDING_STATUS, PlanMetadata};
