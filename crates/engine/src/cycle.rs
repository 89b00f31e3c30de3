// In crates/engine/src/cycle.rs

use std::collections::BTreeMap;
use std::fmt;

use core_types::{AccountState, Bar, FeatureRow, OrderRequest, Quote, Scenario, Signal, Symbol, Timeframe};
use execution::{ExecutionPlan, ExecutionReport};
use features::SummaryStats;
use governance::GovernanceDecision;
use risk::{RiskAssessment, RiskReport};
use serde::{Deserialize, Serialize};
use strategies::AgentThresholds;

/// The stages of one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CycleStage {
    Idle,
    Setup,
    Enter,
    Manage,
    Exit,
    Summary,
}

impl CycleStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStage::Idle => "IDLE",
            CycleStage::Setup => "SETUP",
            CycleStage::Enter => "ENTER",
            CycleStage::Manage => "MANAGE",
            CycleStage::Exit => "EXIT",
            CycleStage::Summary => "SUMMARY",
        }
    }
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller hands to a cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleInput {
    pub symbol: Symbol,
    /// Chronological bars. May be empty.
    #[serde(default)]
    pub bars: Vec<Bar>,
    #[serde(default)]
    pub account: AccountState,
    /// Requested timeframe. Unknown values fall back to the governance or
    /// scenario default.
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub quote: Option<Quote>,
}

impl CycleInput {
    pub fn new(symbol: impl Into<Symbol>, bars: Vec<Bar>) -> Self {
        Self { symbol: symbol.into(), bars, ..Default::default() }
    }

    pub fn with_account(mut self, account: AccountState) -> Self {
        self.account = account;
        self
    }

    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = Some(timeframe.into());
        self
    }

    pub fn with_quote(mut self, quote: Option<Quote>) -> Self {
        self.quote = quote;
        self
    }
}

/// The only durable output of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    /// The scenario whose machine ran this cycle.
    pub scenario: Scenario,
    pub governance: GovernanceDecision,
    pub features: FeatureRow,
    pub stats: SummaryStats,
    pub adjustments: BTreeMap<String, f64>,
    /// Signal thresholds in effect after all adjustments.
    pub thresholds: AgentThresholds,
    pub latest_quote: Option<Quote>,
    pub signal: Signal,
    pub risk_assessment: Option<RiskAssessment>,
    pub risk_report: Option<RiskReport>,
    pub execution_plan: Option<ExecutionPlan>,
    /// The plan as an instruction an order router can take.
    pub order_request: Option<OrderRequest>,
    pub execution_report: Option<ExecutionReport>,
    /// Intraday only: the partial take-profit level derived in MANAGE.
    pub partial_take_ratio: Option<f64>,
    pub states: Vec<CycleStage>,
    pub logs: Vec<String>,
}

impl CycleResult {
    pub fn visited(&self, stage: CycleStage) -> bool {
        self.states.contains(&stage)
    }
}
