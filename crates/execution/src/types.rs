// In crates/execution/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{OrderType, SignalAction, Trade};
use risk::RiskAssessment;
use serde::{Deserialize, Serialize};

/// Status reported for a plan that has been prepared but not routed.
pub const PENDING_STATUS: &str = "pending";

/// Order defaults applied to every plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub order_type: OrderType,
    /// Expected slippage, carried on the plan for the order router.
    pub slippage: f64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self { order_type: OrderType::Market, slippage: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub generated_at: DateTime<Utc>,
    pub source_action: SignalAction,
}

/// A priced, sized and bracketed trade ready for an order router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub trade: Trade,
    pub assessment: RiskAssessment,
    pub order_type: OrderType,
    pub slippage: f64,
    pub metadata: PlanMetadata,
}

/// Monitoring record produced for each plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub execution_status: String,
    pub order_id: Option<String>,
    pub executed_price: Option<f64>,
    pub executed_volume: Option<f64>,
    pub sl_price: Option<f64>,
    pub tp_price: Option<f64>,
    pub execution_time: DateTime<Utc>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub trade: Trade,
}
