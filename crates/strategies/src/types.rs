// In crates/strategies/src/types.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IntradayThresholds {
    pub rvol_threshold: f64,
    /// Percent of the balance risked per trade.
    pub risk_percent: f64,
    pub atr_multiplier: f64,
    pub reward_ratio: f64,
    /// Fraction of the target at which part of the position is taken off.
    pub partial_r: f64,
    pub atr_limit: f64,
    pub drawdown_limit: f64,
}

impl Default for IntradayThresholds {
    fn default() -> Self {
        Self {
            rvol_threshold: 1.8,
            risk_percent: 1.0,
            atr_multiplier: 1.5,
            reward_ratio: 2.0,
            partial_r: 1.0,
            atr_limit: 8.0,
            drawdown_limit: 6.0,
        }
    }
}

impl IntradayThresholds {
    /// Returns a copy with the recognized adjustments applied and floored.
    /// Unknown keys are ignored.
    pub fn apply(&self, adjustments: &BTreeMap<String, f64>) -> Self {
        let mut next = self.clone();
        for (key, value) in adjustments {
            let value = *value;
            match key.as_str() {
                "atr_multiplier" => next.atr_multiplier = value.max(0.5),
                "rvol_threshold" => next.rvol_threshold = value.max(0.5),
                "risk_per_trade" => next.risk_percent = (value * 100.0).max(0.1),
                "risk_percent" => next.risk_percent = value.max(0.1),
                "atr_limit" => next.atr_limit = value.max(0.5),
                _ => {}
            }
        }
        next
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SwingThresholds {
    /// Breakout lookback for new highs.
    pub donchian_high: u32,
    /// Breakout lookback for new lows.
    pub donchian_low: u32,
    pub rvol_threshold: f64,
    pub risk_percent: f64,
    pub atr_multiplier: f64,
    /// Target distance as a multiple of the stop distance.
    pub reward_ratio: f64,
    pub max_positions: usize,
    pub max_correlation: f64,
    pub rebalance_period: String,
}

impl Default for SwingThresholds {
    fn default() -> Self {
        Self {
            donchian_high: 55,
            donchian_low: 20,
            rvol_threshold: 1.5,
            risk_percent: 0.8,
            atr_multiplier: 2.0,
            reward_ratio: 2.5,
            max_positions: 6,
            max_correlation: 0.65,
            rebalance_period: "weekly".to_string(),
        }
    }
}

impl SwingThresholds {
    pub fn apply(&self, adjustments: &BTreeMap<String, f64>) -> Self {
        let mut next = self.clone();
        for (key, value) in adjustments {
            let value = *value;
            match key.as_str() {
                "donchian_high" => next.donchian_high = (value.max(0.0) as u32).max(20),
                "donchian_low" => next.donchian_low = (value.max(0.0) as u32).max(10),
                "rvol_threshold" => next.rvol_threshold = value.max(1.0),
                "atr_multiplier" => next.atr_multiplier = value.max(1.0),
                "risk_per_trade" => next.risk_percent = (value * 100.0).max(0.2),
                _ => {}
            }
        }
        next
    }
}

/// Thresholds for whichever scenario a cycle runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "lowercase")]
pub enum AgentThresholds {
    Intraday(IntradayThresholds),
    Swing(SwingThresholds),
}

impl AgentThresholds {
    pub fn apply(&self, adjustments: &BTreeMap<String, f64>) -> Self {
        match self {
            AgentThresholds::Intraday(t) => AgentThresholds::Intraday(t.apply(adjustments)),
            AgentThresholds::Swing(t) => AgentThresholds::Swing(t.apply(adjustments)),
        }
    }

    pub fn atr_multiplier(&self) -> f64 {
        match self {
            AgentThresholds::Intraday(t) => t.atr_multiplier,
            AgentThresholds::Swing(t) => t.atr_multiplier,
        }
    }

    pub fn rvol_threshold(&self) -> f64 {
        match self {
            AgentThresholds::Intraday(t) => t.rvol_threshold,
            AgentThresholds::Swing(t) => t.rvol_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn intraday_adjustments_are_floored() {
        let base = IntradayThresholds::default();
        let next = base.apply(&adj(&[("atr_multiplier", 0.1), ("risk_per_trade", 0.005), ("unknown", 9.0)]));
        assert_eq!(next.atr_multiplier, 0.5);
        assert_eq!(next.risk_percent, 0.5);
        assert_eq!(next.rvol_threshold, base.rvol_threshold);
        // The input snapshot is untouched.
        assert_eq!(base.atr_multiplier, 1.5);
    }

    #[test]
    fn swing_lookbacks_truncate_and_floor() {
        let next = SwingThresholds::default().apply(&adj(&[("donchian_high", 37.9), ("donchian_low", 4.0), ("rvol_threshold", 0.7)]));
        assert_eq!(next.donchian_high, 37);
        assert_eq!(next.donchian_low, 10);
        assert_eq!(next.rvol_threshold, 1.0);
    }
}
