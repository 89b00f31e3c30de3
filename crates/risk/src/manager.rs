// In crates/risk/src/manager.rs

use core_types::{Side, Signal, round_dp};
use tracing::debug;

use crate::types::{PortfolioRisk, PositionSizing, RiskAssessment, RiskParameters};
use crate::{Error, Result};

pub const LOW_REWARD_WARNING: &str = "reward:risk below 1.0";
pub const MIN_SIZE_WARNING: &str = "position size at minimum";

/// Stop, target and size calculations over one set of [`RiskParameters`].
///
/// Stops default to an ATR multiple (or 1% of the entry without ATR), targets
/// to a reward:risk multiple of the stop distance, and the size risks a fixed
/// fraction of the balance.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskManager {
    parameters: RiskParameters,
}

impl RiskManager {
    pub fn new(parameters: RiskParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &RiskParameters {
        &self.parameters
    }

    pub fn suggest_stop_loss(
        &self,
        side: Side,
        entry_price: f64,
        atr_value: Option<f64>,
        atr_multiplier: Option<f64>,
    ) -> Result<f64> {
        if !(entry_price > 0.0) || !entry_price.is_finite() {
            return Err(Error::InvalidInput(format!("entry_price must be positive, got {entry_price}")));
        }
        let multiplier = atr_multiplier
            .filter(|m| *m > 0.0)
            .unwrap_or(self.parameters.atr_multiplier);
        let distance = match atr_value {
            Some(atr) if atr > 0.0 => atr * multiplier,
            _ => entry_price * 0.01,
        };
        Ok((entry_price - side.direction() * distance).max(0.0))
    }

    pub fn suggest_take_profit(
        &self,
        side: Side,
        entry_price: f64,
        stop_loss: f64,
        reward_risk: Option<f64>,
    ) -> Result<f64> {
        let ratio = reward_risk.unwrap_or(self.parameters.reward_risk);
        if !(ratio > 0.0) {
            return Err(Error::InvalidParameter(format!("reward:risk ratio must be positive, got {ratio}")));
        }
        let risk_per_unit = (entry_price - stop_loss).abs();
        Ok((entry_price + side.direction() * risk_per_unit * ratio).max(0.0))
    }

    /// Units that risk exactly the allowed amount between entry and stop,
    /// clamped to the configured position bounds.
    pub fn position_size(&self, entry_price: f64, stop_loss: f64) -> Result<PositionSizing> {
        let risk_amount = self.parameters.risk_amount()?;
        let per_unit_risk = (entry_price - stop_loss).abs() * self.parameters.contract_size;
        if !(per_unit_risk > 0.0) {
            return Err(Error::InvalidStop { entry_price, stop_loss });
        }

        let mut quantity = (risk_amount / per_unit_risk).max(self.parameters.min_position);
        if let Some(max) = self.parameters.max_position {
            quantity = quantity.min(max);
        }

        Ok(PositionSizing { quantity: round_dp(quantity, 6), risk_amount, per_unit_risk })
    }

    pub fn reward_ratio(entry_price: f64, stop_loss: f64, take_profit: f64) -> f64 {
        let risk = (entry_price - stop_loss).abs();
        if risk == 0.0 {
            return 0.0;
        }
        (take_profit - entry_price).abs() / risk
    }

    /// Fills in whatever stop or target is missing, sizes the trade and flags
    /// weak setups. Identical inputs always give an identical assessment.
    pub fn assess_trade(
        &self,
        side: Side,
        entry_price: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        atr_value: Option<f64>,
    ) -> Result<RiskAssessment> {
        let stop = match stop_loss {
            Some(stop) => stop,
            None => self.suggest_stop_loss(side, entry_price, atr_value, None)?,
        };
        let take = match take_profit {
            Some(take) => take,
            None => self.suggest_take_profit(side, entry_price, stop, None)?,
        };

        let sizing = self.position_size(entry_price, stop)?;
        let reward_ratio = Self::reward_ratio(entry_price, stop, take);

        let mut warnings = Vec::new();
        if reward_ratio < 1.0 {
            warnings.push(LOW_REWARD_WARNING.to_string());
        }
        if sizing.quantity <= self.parameters.min_position {
            warnings.push(MIN_SIZE_WARNING.to_string());
        }

        let assessment = RiskAssessment {
            stop_loss: round_dp(stop, 6),
            take_profit: round_dp(take, 6),
            position_size: sizing.quantity,
            risk_amount: round_dp(sizing.risk_amount, 2),
            reward_ratio: round_dp(reward_ratio, 2),
            warnings,
        };
        debug!(%side, entry_price, ?assessment, "Trade assessed");
        Ok(assessment)
    }

    pub fn assess_signal(&self, signal: &Signal, atr_value: Option<f64>) -> Result<RiskAssessment> {
        let side = signal.side.ok_or(Error::MissingSide)?;
        let entry = signal.entry_price.ok_or(Error::MissingPrice)?;
        self.assess_trade(side, entry, signal.stop_loss, signal.take_profit, atr_value)
    }

    /// A negative drawdown is profit and never blocks trading.
    pub fn ensure_can_trade(&self, current_drawdown: f64, max_drawdown: f64) -> bool {
        current_drawdown < 0.0 || current_drawdown <= max_drawdown
    }

    pub fn score_portfolio_risk(
        &self,
        exposures: &[f64],
        correlation_risk: f64,
        drawdown_risk: f64,
    ) -> PortfolioRisk {
        let total: f64 = exposures.iter().map(|e| e.abs()).sum();
        let concentration = exposures.iter().map(|e| e.abs()).fold(0.0, f64::max);
        PortfolioRisk {
            total_exposure: round_dp(total, 4),
            concentration_risk: round_dp(concentration, 4),
            correlation_risk: round_dp(correlation_risk, 4),
            drawdown_risk: round_dp(drawdown_risk, 4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core_types::{SignalAction, Symbol, Timeframe};

    fn manager() -> RiskManager {
        RiskManager::new(RiskParameters {
            account_balance: 10_000.0,
            risk_per_trade: 0.01,
            contract_size: 1.0,
            min_position: 0.01,
            max_position: None,
            reward_risk: 2.0,
            atr_multiplier: 1.5,
        })
    }

    #[test]
    fn stop_loss_uses_atr_or_one_percent() {
        let m = manager();
        assert_relative_eq!(m.suggest_stop_loss(Side::Buy, 100.0, Some(2.0), None).unwrap(), 97.0);
        assert_relative_eq!(m.suggest_stop_loss(Side::Sell, 100.0, Some(2.0), Some(2.0)).unwrap(), 104.0);
        assert_relative_eq!(m.suggest_stop_loss(Side::Buy, 100.0, None, None).unwrap(), 99.0);
        assert_relative_eq!(m.suggest_stop_loss(Side::Buy, 100.0, Some(0.0), None).unwrap(), 99.0);
        assert_eq!(m.suggest_stop_loss(Side::Buy, 1.0, Some(10.0), None).unwrap(), 0.0);
        assert!(matches!(m.suggest_stop_loss(Side::Buy, 0.0, None, None), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn take_profit_scales_the_stop_distance() {
        let m = manager();
        assert_relative_eq!(m.suggest_take_profit(Side::Buy, 100.0, 97.0, None).unwrap(), 106.0);
        assert_relative_eq!(m.suggest_take_profit(Side::Sell, 100.0, 103.0, Some(1.0)).unwrap(), 97.0);
        assert!(matches!(
            m.suggest_take_profit(Side::Buy, 100.0, 97.0, Some(0.0)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn position_size_risks_the_allowed_amount() {
        let sizing = manager().position_size(100.0, 97.0).unwrap();
        assert_relative_eq!(sizing.risk_amount, 100.0);
        assert_relative_eq!(sizing.quantity, 33.333333);
    }

    #[test]
    fn position_size_is_clamped_and_rejects_flat_stops() {
        let capped = RiskManager::new(RiskParameters { max_position: Some(5.0), ..manager().parameters().clone() });
        assert_eq!(capped.position_size(100.0, 99.0).unwrap().quantity, 5.0);

        let floored = RiskManager::new(RiskParameters { min_position: 2.0, ..manager().parameters().clone() });
        assert_eq!(floored.position_size(100.0, 10.0).unwrap().quantity, 2.0);

        assert!(matches!(manager().position_size(100.0, 100.0), Err(Error::InvalidStop { .. })));
    }

    #[test]
    fn assessment_fills_brackets_and_is_idempotent() {
        let m = manager();
        let first = m.assess_trade(Side::Buy, 100.0, None, None, Some(2.0)).unwrap();
        let second = m.assess_trade(Side::Buy, 100.0, None, None, Some(2.0)).unwrap();
        assert_eq!(first, second);
        assert_relative_eq!(first.stop_loss, 97.0);
        assert_relative_eq!(first.take_profit, 106.0);
        assert_relative_eq!(first.reward_ratio, 2.0);
        assert_relative_eq!(first.risk_amount, 100.0);
        assert!(first.warnings.is_empty());
    }

    #[test]
    fn assessment_warns_on_weak_setups() {
        let m = RiskManager::new(RiskParameters { min_position: 50.0, ..manager().parameters().clone() });
        let weak = m.assess_trade(Side::Sell, 100.0, Some(102.0), Some(99.0), None).unwrap();
        assert_relative_eq!(weak.reward_ratio, 0.5);
        assert_eq!(weak.position_size, 50.0);
        assert_eq!(weak.warnings, vec![LOW_REWARD_WARNING.to_string(), MIN_SIZE_WARNING.to_string()]);
    }

    #[test]
    fn signal_assessment_needs_side_and_price() {
        let m = manager();
        let mut signal = Signal::new(Symbol::from("XAUUSD"), Timeframe::M15, SignalAction::Enter, 0.7, "breakout confirmed");
        assert_eq!(m.assess_signal(&signal, None), Err(Error::MissingSide));
        signal.side = Some(Side::Buy);
        assert_eq!(m.assess_signal(&signal, None), Err(Error::MissingPrice));
        signal.entry_price = Some(2010.0);
        assert!(m.assess_signal(&signal, Some(5.0)).is_ok());
    }

    #[test]
    fn drawdown_gate_and_portfolio_score() {
        let m = manager();
        assert!(m.ensure_can_trade(-3.0, 6.0));
        assert!(m.ensure_can_trade(6.0, 6.0));
        assert!(!m.ensure_can_trade(6.5, 6.0));

        let score = m.score_portfolio_risk(&[100.0, -250.123456, 50.0], 0.7, 3.0);
        assert_relative_eq!(score.total_exposure, 400.1235);
        assert_relative_eq!(score.concentration_risk, 250.1235);
        assert_eq!(m.score_portfolio_risk(&[], 0.0, 0.0), PortfolioRisk::default());
    }
}
