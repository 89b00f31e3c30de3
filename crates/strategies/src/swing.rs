// In crates/strategies/src/swing.rs

use advisor::{AdvisorHandle, Prompt};
use async_trait::async_trait;
use core_types::{Side, Signal, SignalAction};
use risk::RiskManager;
use tracing::{debug, info};

use crate::parse::{DecisionDefaults, parse_decision};
use crate::types::SwingThresholds;
use crate::{Result, SignalAgent, SignalContext};

pub const ENTER_CONFIDENCE: f64 = 0.62;
pub const SKIP_CONFIDENCE: f64 = 0.45;
pub const POSITION_LIMIT_REASON: &str = "Open position limit reached";

const DEFAULTS: DecisionDefaults = DecisionDefaults { confidence: 0.55, reason: "Swing decision" };

const INSTRUCTIONS: &str = "You are a swing trader managing a small portfolio. Enter on Donchian \
breakouts that agree with the long-term EMA and come with above-threshold relative volume, and \
respect the position and correlation limits. Answer with the keys action (enter, exit, skip or \
manage), side (buy or sell), entry, sl, tp, size, confidence, reason and optionally attachments.";

/// Donchian breakouts filtered by the long-term trend, with portfolio limits.
#[derive(Debug, Clone, Default)]
pub struct SwingSignalAgent {
    thresholds: SwingThresholds,
    risk_manager: Option<RiskManager>,
    advisor: Option<AdvisorHandle>,
}

impl SwingSignalAgent {
    pub fn new(thresholds: SwingThresholds) -> Self {
        Self { thresholds, risk_manager: None, advisor: None }
    }

    pub fn with_risk_manager(mut self, risk_manager: Option<RiskManager>) -> Self {
        self.risk_manager = risk_manager;
        self
    }

    pub fn with_advisor(mut self, advisor: Option<AdvisorHandle>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn thresholds(&self) -> &SwingThresholds {
        &self.thresholds
    }

    pub fn fallback_signal(&self, ctx: &SignalContext<'_>) -> Result<Signal> {
        let f = ctx.features;
        let limit_reached = ctx.account.open_position_count() >= self.thresholds.max_positions;
        let mut entry: Option<(Side, f64, f64)> = None;

        if !limit_reached {
            if let (Some(close), Some(trend), Some(atr), Some(rvol)) = (f.close, f.ema_slow, f.atr, f.rvol) {
                if rvol >= self.thresholds.rvol_threshold {
                    if f.donchian_upper.is_some_and(|upper| close >= upper) && close >= trend {
                        entry = Some((Side::Buy, close, atr));
                    } else if f.donchian_lower.is_some_and(|lower| close <= lower) && close <= trend {
                        entry = Some((Side::Sell, close, atr));
                    }
                }
            }
        }

        let mut signal = match entry {
            Some((side, close, atr)) => {
                let mut signal = Signal::new(
                    ctx.symbol.clone(),
                    ctx.timeframe,
                    SignalAction::Enter,
                    ENTER_CONFIDENCE,
                    "Fallback rules: Donchian breakout confirmed by trend and volume",
                );
                signal.side = Some(side);
                match &self.risk_manager {
                    Some(manager) => {
                        let assessment = manager.assess_trade(side, close, None, None, Some(atr))?;
                        signal.stop_loss = Some(assessment.stop_loss);
                        signal.take_profit = Some(assessment.take_profit);
                        signal.quantity = Some(assessment.position_size);
                    }
                    None => {
                        let stop = close - side.direction() * atr * self.thresholds.atr_multiplier;
                        signal.stop_loss = Some(stop);
                        signal.take_profit =
                            Some(close + side.direction() * (close - stop).abs() * self.thresholds.reward_ratio);
                    }
                }
                signal.tags = vec!["fallback".to_string()];
                signal
            }
            None => {
                let reason = if limit_reached {
                    POSITION_LIMIT_REASON
                } else {
                    "Portfolio conditions do not allow a new trade"
                };
                let mut signal =
                    Signal::new(ctx.symbol.clone(), ctx.timeframe, SignalAction::Skip, SKIP_CONFIDENCE, reason);
                signal.tags = vec!["skip".to_string()];
                signal
            }
        };
        signal.entry_price = f.close;
        signal.indicators = f.clone();
        signal.market_regime = ctx.market_regime();
        Ok(signal)
    }

    fn prompt(&self, ctx: &SignalContext<'_>) -> Prompt {
        Prompt::new(INSTRUCTIONS)
            .with("symbol", ctx.symbol)
            .with("timeframe", ctx.timeframe)
            .with("indicators", ctx.features)
            .with("portfolio_state", &ctx.account.open_positions)
            .with("market_regime", ctx.account.market_regime.as_deref().unwrap_or("unknown"))
            .with("volatility_data", ctx.stats)
            .with("correlation_matrix", &ctx.account.correlation_data)
            .with("thresholds", &self.thresholds)
    }
}

#[async_trait]
impl SignalAgent for SwingSignalAgent {
    fn name(&self) -> &'static str {
        "swing"
    }

    async fn generate_signal(&self, ctx: &SignalContext<'_>) -> Result<Signal> {
        if let Some(advisor) = &self.advisor {
            let decision = advisor
                .ask_json(&self.prompt(ctx))
                .await
                .and_then(|map| parse_decision(&map, ctx, &DEFAULTS));
            match decision {
                Ok(signal) => {
                    info!(agent = self.name(), action = %signal.action, "Signal from advisor");
                    return Ok(signal);
                }
                Err(err) => advisor::log_fallback(self.name(), &err),
            }
        }

        let signal = self.fallback_signal(ctx)?;
        debug!(agent = self.name(), action = %signal.action, side = ?signal.side, "Fallback signal");
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use advisor::StaticAdvisor;
    use core_types::{AccountState, FeatureRow, PositionSnapshot, Symbol, Timeframe};
    use features::SummaryStats;
    use std::sync::Arc;
    use std::time::Duration;

    fn breakout() -> FeatureRow {
        FeatureRow {
            close: Some(110.0),
            ema_slow: Some(100.0),
            donchian_upper: Some(109.0),
            donchian_lower: Some(90.0),
            rvol: Some(1.6),
            atr: Some(2.0),
            ..Default::default()
        }
    }

    async fn run_agent(agent: &SwingSignalAgent, features: &FeatureRow, account: &AccountState) -> Signal {
        let symbol = Symbol::from("EURUSD");
        let stats = SummaryStats::default();
        let ctx = SignalContext { symbol: &symbol, timeframe: Timeframe::H4, features, stats: &stats, account };
        agent.generate_signal(&ctx).await.unwrap()
    }

    async fn run(features: &FeatureRow, account: &AccountState) -> Signal {
        run_agent(&SwingSignalAgent::default(), features, account).await
    }

    fn advised(reply: &str) -> SwingSignalAgent {
        let handle = AdvisorHandle::new(Arc::new(StaticAdvisor::new(reply)), Duration::from_secs(1));
        SwingSignalAgent::default().with_advisor(Some(handle))
    }

    #[tokio::test]
    async fn breakout_above_trend_enters_long() {
        let signal = run(&breakout(), &AccountState::default()).await;
        assert_eq!(signal.action, SignalAction::Enter);
        assert_eq!(signal.side, Some(Side::Buy));
        assert_eq!(signal.confidence, ENTER_CONFIDENCE);
        // 2 ATR stop, 2.5R target.
        assert_relative_eq!(signal.stop_loss.unwrap(), 106.0);
        assert_relative_eq!(signal.take_profit.unwrap(), 120.0);
    }

    #[tokio::test]
    async fn full_book_skips_regardless_of_setup() {
        let account = AccountState { open_positions: vec![PositionSnapshot::default(); 6], ..Default::default() };
        let signal = run(&breakout(), &account).await;
        assert_eq!(signal.action, SignalAction::Skip);
        assert_eq!(signal.confidence, SKIP_CONFIDENCE);
        assert!(signal.reason.to_lowercase().contains("position limit"));
        assert_eq!(signal.tags, vec!["skip".to_string()]);
    }

    #[tokio::test]
    async fn breakdown_below_trend_enters_short() {
        let features = FeatureRow { close: Some(89.0), ..breakout() };
        let signal = run(&features, &AccountState::default()).await;
        assert_eq!(signal.side, Some(Side::Sell));
        assert_relative_eq!(signal.stop_loss.unwrap(), 93.0);
    }

    #[tokio::test]
    async fn breakout_against_trend_skips() {
        let features = FeatureRow { ema_slow: Some(115.0), ..breakout() };
        let signal = run(&features, &AccountState::default()).await;
        assert_eq!(signal.action, SignalAction::Skip);
        assert_eq!(signal.entry_price, Some(110.0));
    }

    #[tokio::test]
    async fn advisor_reply_without_confidence_uses_the_swing_default() {
        let agent = advised(r#"{"action": "enter", "side": "buy", "reason": "weekly breakout holds"}"#);
        let signal = run_agent(&agent, &breakout(), &AccountState::default()).await;
        assert_eq!(signal.action, SignalAction::Enter);
        assert_eq!(signal.side, Some(Side::Buy));
        assert_eq!(signal.confidence, 0.55);
        assert_eq!(signal.reason, "weekly breakout holds");
    }

    #[tokio::test]
    async fn malformed_advisor_reply_falls_back_to_the_rules() {
        let agent = advised(r#"{"action": "enter", "side": "buy", "size": 0}"#);
        let signal = run_agent(&agent, &breakout(), &AccountState::default()).await;
        assert_eq!(signal.tags, vec!["fallback".to_string()]);
        assert_eq!(signal.confidence, ENTER_CONFIDENCE);
        assert_relative_eq!(signal.stop_loss.unwrap(), 106.0);
    }
}
