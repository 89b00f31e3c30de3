// In crates/core-types/src/account.rs

use serde::{Deserialize, Serialize};

/// One open position as reported by the account collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl PositionSnapshot {
    /// Reported exposure, or quantity × price when the exposure is missing.
    pub fn exposure(&self) -> f64 {
        self.exposure
            .unwrap_or_else(|| self.quantity.unwrap_or(0.0) * self.price.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Account snapshot supplied with every cycle. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_balance: Option<f64>,
    /// Realized drawdown in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_drawdown: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_per_trade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_position: Option<f64>,
    #[serde(alias = "positions")]
    pub open_positions: Vec<PositionSnapshot>,
    pub current_positions: Vec<PositionSnapshot>,
    pub drawdown_history: Vec<f64>,
    pub correlation_data: CorrelationData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_regime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_timeframe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_position: Option<PositionSnapshot>,
    pub execution_history: Vec<serde_json::Value>,
}

impl AccountState {
    pub fn with_balance(balance: f64) -> Self {
        Self { account_balance: Some(balance), ..Default::default() }
    }

    /// Positions used for exposure scoring; falls back to `open_positions`.
    pub fn exposure_positions(&self) -> &[PositionSnapshot] {
        if self.current_positions.is_empty() {
            &self.open_positions
        } else {
            &self.current_positions
        }
    }

    pub fn open_position_count(&self) -> usize {
        self.open_positions.len().max(self.current_positions.len())
    }

    pub fn latest_drawdown(&self) -> f64 {
        self.drawdown_history.last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_deserializes_with_defaults() {
        let account: AccountState = serde_json::from_str("{}").unwrap();
        assert_eq!(account, AccountState::default());
        assert_eq!(account.latest_drawdown(), 0.0);
    }

    #[test]
    fn positions_alias_and_exposure_fallback() {
        let account: AccountState = serde_json::from_str(
            r#"{"account_balance": 4000, "positions": [{"quantity": 2, "price": 50}, {"exposure": -30}]}"#,
        )
        .unwrap();
        assert_eq!(account.open_position_count(), 2);
        let exposures: Vec<f64> = account.exposure_positions().iter().map(|p| p.exposure()).collect();
        assert_eq!(exposures, vec![100.0, -30.0]);
    }
}
