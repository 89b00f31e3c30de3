// In crates/governance/src/lib.rs

//! Picks the trading scenario for a cycle and the high-level risk posture
//! that goes with it.

use std::collections::BTreeMap;

use advisor::{AdvisorHandle, Prompt};
use core_types::{AccountState, Scenario};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

pub const RISK_PER_TRADE: &str = "risk_per_trade";
pub const RVOL_THRESHOLD: &str = "rvol_threshold";

/// Realized drawdown (percent) above which risk per trade is halved.
const DRAWDOWN_LIMIT: f64 = 4.0;
/// Open position count at which the volume filter is tightened.
const CROWDED_POSITIONS: usize = 5;

const INSTRUCTIONS: &str = "You govern an automated trading desk with two scenarios: \
\"intraday\" (short holding periods, small accounts) and \"swing\" (multi-day holds). \
Choose the scenario for the next cycle and suggest numeric parameter adjustments. \
Answer with the keys scenario, reason, adjustments (object of numbers) and recommended_timeframe.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceSettings {
    /// Balance at or above which the swing scenario is chosen.
    pub swing_threshold: f64,
    /// Balance at or above which the caller's preferred scenario is honoured.
    pub caution_threshold: f64,
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self { swing_threshold: 5000.0, caution_threshold: 3000.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceDecision {
    pub scenario: Scenario,
    pub reason: String,
    #[serde(default)]
    pub adjustments: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_timeframe: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GovernanceController {
    settings: GovernanceSettings,
    advisor: Option<AdvisorHandle>,
}

impl GovernanceController {
    pub fn new(settings: GovernanceSettings) -> Self {
        Self { settings, advisor: None }
    }

    pub fn with_advisor(mut self, advisor: Option<AdvisorHandle>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn settings(&self) -> &GovernanceSettings {
        &self.settings
    }

    /// Never fails: any advisor problem is answered with the rule-based decision.
    pub async fn decide(&self, account: &AccountState, preferred: Option<Scenario>) -> GovernanceDecision {
        let Some(advisor) = &self.advisor else {
            return self.fallback_decision(account, preferred);
        };

        let prompt = Prompt::new(INSTRUCTIONS)
            .with("account_balance", account.account_balance.unwrap_or(0.0))
            .with("realized_drawdown", account.realized_drawdown.unwrap_or(0.0))
            .with("open_positions", &account.open_positions)
            .with("preferred", preferred.map(Scenario::as_str).unwrap_or(""))
            .with("preferred_timeframe", account.preferred_timeframe.as_deref().unwrap_or(""))
            .with("balance_threshold", self.settings.swing_threshold)
            .with("caution_threshold", self.settings.caution_threshold);

        match advisor.ask_json(&prompt).await {
            Ok(map) => {
                let decision = parse_decision(&map, preferred);
                info!(scenario = %decision.scenario, advisor = advisor.name(), "Governance decision from advisor");
                decision
            }
            Err(err) => {
                advisor::log_fallback("governance", &err);
                self.fallback_decision(account, preferred)
            }
        }
    }

    pub fn fallback_decision(&self, account: &AccountState, preferred: Option<Scenario>) -> GovernanceDecision {
        let balance = account.account_balance.unwrap_or(0.0);
        let drawdown = account.realized_drawdown.unwrap_or(0.0);

        let (scenario, mut reason) = if balance >= self.settings.swing_threshold {
            (Scenario::Swing, "Account balance exceeds swing threshold".to_string())
        } else if balance >= self.settings.caution_threshold {
            (
                preferred.unwrap_or(Scenario::Intraday),
                "Balance in caution zone, maintain preferred scenario".to_string(),
            )
        } else {
            (Scenario::Intraday, "Balance below swing threshold".to_string())
        };
        if let Some(preferred) = preferred.filter(|p| *p != scenario) {
            reason.push_str(&format!(" (override recommendation: {preferred})"));
        }

        let mut adjustments = BTreeMap::new();
        let risk_per_trade = if drawdown > DRAWDOWN_LIMIT {
            0.005
        } else if balance >= self.settings.swing_threshold {
            0.008
        } else {
            0.01
        };
        adjustments.insert(RISK_PER_TRADE.to_string(), risk_per_trade);
        if account.open_positions.len() >= CROWDED_POSITIONS {
            adjustments.insert(RVOL_THRESHOLD.to_string(), 2.0);
        }

        GovernanceDecision {
            scenario,
            reason,
            adjustments,
            recommended_timeframe: account.preferred_timeframe.as_deref().map(str::to_uppercase),
        }
    }
}

fn parse_decision(map: &Map<String, Value>, preferred: Option<Scenario>) -> GovernanceDecision {
    let scenario = map
        .get("scenario")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Scenario>().ok())
        .or(preferred)
        .unwrap_or(Scenario::Intraday);

    let reason = map
        .get("reason")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Advisor decision")
        .to_string();

    // Only real numbers survive; strings and booleans are dropped.
    let adjustments = match map.get("adjustments") {
        Some(Value::Object(items)) => items
            .iter()
            .filter_map(|(key, value)| value.as_f64().filter(|v| v.is_finite()).map(|v| (key.clone(), v)))
            .collect(),
        _ => BTreeMap::new(),
    };

    GovernanceDecision {
        scenario,
        reason,
        adjustments,
        recommended_timeframe: map
            .get("recommended_timeframe")
            .and_then(Value::as_str)
            .map(str::to_uppercase),
    }
}
