// In crates/risk/src/types.rs

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Account-level risk settings owned by a single decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub account_balance: f64,
    /// Fraction of the balance risked per trade, in `(0, 1]`.
    pub risk_per_trade: f64,
    pub contract_size: f64,
    pub min_position: f64,
    pub max_position: Option<f64>,
    pub reward_risk: f64,
    pub atr_multiplier: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            account_balance: 10_000.0,
            risk_per_trade: 0.01,
            contract_size: 1.0,
            min_position: 0.01,
            max_position: None,
            reward_risk: 2.0,
            atr_multiplier: 1.5,
        }
    }
}

impl RiskParameters {
    /// The money at risk on one trade.
    pub fn risk_amount(&self) -> Result<f64> {
        if !(self.account_balance > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "account_balance must be positive, got {}",
                self.account_balance
            )));
        }
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "risk_per_trade must be in (0, 1], got {}",
                self.risk_per_trade
            )));
        }
        Ok(self.account_balance * self.risk_per_trade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizing {
    pub quantity: f64,
    pub risk_amount: f64,
    pub per_unit_risk: f64,
}

/// Risk profile of one trade idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
    pub risk_amount: f64,
    pub reward_ratio: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRisk {
    pub total_exposure: f64,
    pub concentration_risk: f64,
    pub correlation_risk: f64,
    pub drawdown_risk: f64,
}

/// Account-wide verdict produced by the risk agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub can_trade: bool,
    pub max_position_size: f64,
    pub risk_adjustment_factor: f64,
    pub violations: Vec<String>,
    pub recommendations: Vec<String>,
    pub portfolio_risk: PortfolioRisk,
}
