// In crates/strategies/src/intraday.rs

use advisor::{AdvisorHandle, Prompt};
use async_trait::async_trait;
use core_types::{Side, Signal, SignalAction};
use risk::RiskManager;
use tracing::{debug, info};

use crate::parse::{DecisionDefaults, parse_decision};
use crate::types::IntradayThresholds;
use crate::{Result, SignalAgent, SignalContext};

pub const ENTER_CONFIDENCE: f64 = 0.68;
pub const SKIP_CONFIDENCE: f64 = 0.35;

const DEFAULTS: DecisionDefaults = DecisionDefaults { confidence: 0.5, reason: "Intraday decision" };

const INSTRUCTIONS: &str = "You are an intraday trader. Enter only when the fast EMA confirms the trend, \
price breaks the Donchian channel in the trend direction and relative volume is at least the threshold. \
Answer with the keys action (enter, exit, skip or manage), side (buy or sell), entry, sl, tp, size, \
confidence, reason and optionally attachments.";

/// Trend-plus-breakout entries on short timeframes.
#[derive(Debug, Clone, Default)]
pub struct IntradaySignalAgent {
    thresholds: IntradayThresholds,
    risk_manager: Option<RiskManager>,
    advisor: Option<AdvisorHandle>,
}

impl IntradaySignalAgent {
    pub fn new(thresholds: IntradayThresholds) -> Self {
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

    pub fn thresholds(&self) -> &IntradayThresholds {
        &self.thresholds
    }

    /// Rule-based decision: rising (or falling) EMAs, a close through the
    /// Donchian band on the same side, and enough relative volume.
    pub fn fallback_signal(&self, ctx: &SignalContext<'_>) -> Result<Signal> {
        let f = ctx.features;
        let mut entry: Option<(Side, f64, f64)> = None;

        if let (Some(close), Some(fast), Some(slow), Some(rvol), Some(atr)) =
            (f.close, f.ema_fast, f.ema_slow, f.rvol, f.atr)
        {
            if rvol >= self.thresholds.rvol_threshold {
                let trend_up = fast > slow;
                let breakout_up = f.donchian_upper.is_some_and(|upper| close >= upper);
                let breakout_down = f.donchian_lower.is_some_and(|lower| close <= lower);
                if trend_up && breakout_up {
                    entry = Some((Side::Buy, close, atr));
                } else if !trend_up && breakout_down {
                    entry = Some((Side::Sell, close, atr));
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
                    "Fallback rules: trend confirmed by a high-volume range breakout",
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
                let mut signal = Signal::new(
                    ctx.symbol.clone(),
                    ctx.timeframe,
                    SignalAction::Skip,
                    SKIP_CONFIDENCE,
                    "Not enough conditions to open a position",
                );
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
            .with("features", ctx.features)
            .with("current_position", &ctx.account.current_position)
            .with("market_regime", ctx.account.market_regime.as_deref().unwrap_or("unknown"))
            .with("account_info", ctx.account)
            .with("thresholds", &self.thresholds)
    }
}

#[async_trait]
impl SignalAgent for IntradaySignalAgent {
    fn name(&self) -> &'static str {
        "intraday"
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
    use advisor::StaticAdvisor;
    use approx::assert_relative_eq;
    use core_types::{AccountState, FeatureRow, Symbol, Timeframe};
    use features::SummaryStats;
    use risk::RiskParameters;
    use std::sync::Arc;
    use std::time::Duration;

    fn breakout_features() -> FeatureRow {
        FeatureRow {
            close: Some(2010.0),
            ema_fast: Some(2005.0),
            ema_slow: Some(1990.0),
            donchian_upper: Some(2008.0),
            donchian_lower: Some(1950.0),
            rvol: Some(2.0),
            atr: Some(5.0),
            ..Default::default()
        }
    }

    async fn run(agent: &IntradaySignalAgent, features: &FeatureRow) -> Signal {
        let symbol = Symbol::from("XAUUSD");
        let stats = SummaryStats::default();
        let account = AccountState::default();
        let ctx = SignalContext { symbol: &symbol, timeframe: Timeframe::M15, features, stats: &stats, account: &account };
        agent.generate_signal(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn uptrend_breakout_with_volume_enters_long() {
        let signal = run(&IntradaySignalAgent::default(), &breakout_features()).await;
        assert_eq!(signal.action, SignalAction::Enter);
        assert_eq!(signal.side, Some(Side::Buy));
        assert_eq!(signal.confidence, ENTER_CONFIDENCE);
        assert_eq!(signal.entry_price, Some(2010.0));
        // Inline arithmetic: 1.5 ATR stop, 2R target.
        assert_relative_eq!(signal.stop_loss.unwrap(), 2002.5);
        assert_relative_eq!(signal.take_profit.unwrap(), 2025.0);
        assert_eq!(signal.tags, vec!["fallback".to_string()]);
    }

    #[tokio::test]
    async fn risk_manager_sizes_the_entry() {
        let manager = RiskManager::new(RiskParameters { account_balance: 4000.0, ..Default::default() });
        let agent = IntradaySignalAgent::default().with_risk_manager(Some(manager));
        let signal = run(&agent, &breakout_features()).await;
        assert_relative_eq!(signal.stop_loss.unwrap(), 2002.5);
        assert_relative_eq!(signal.quantity.unwrap(), 5.333333);
    }

    #[tokio::test]
    async fn low_volume_or_missing_indicators_skip() {
        let quiet = FeatureRow { rvol: Some(1.2), ..breakout_features() };
        let signal = run(&IntradaySignalAgent::default(), &quiet).await;
        assert_eq!(signal.action, SignalAction::Skip);
        assert_eq!(signal.confidence, SKIP_CONFIDENCE);
        assert_eq!(signal.tags, vec!["skip".to_string()]);

        let signal = run(&IntradaySignalAgent::default(), &FeatureRow::default()).await;
        assert_eq!(signal.action, SignalAction::Skip);
        assert_eq!(signal.entry_price, None);
    }

    #[tokio::test]
    async fn downtrend_breakdown_enters_short() {
        let features = FeatureRow {
            close: Some(1940.0),
            ema_fast: Some(1960.0),
            ema_slow: Some(1990.0),
            donchian_lower: Some(1945.0),
            ..breakout_features()
        };
        let signal = run(&IntradaySignalAgent::default(), &features).await;
        assert_eq!(signal.side, Some(Side::Sell));
        assert!(signal.stop_loss.unwrap() > 1940.0);
    }

    #[tokio::test]
    async fn malformed_advisor_reply_falls_back() {
        let handle = AdvisorHandle::new(Arc::new(StaticAdvisor::new(r#"{"action": "enter", "entry": -1}"#)), Duration::from_secs(1));
        let agent = IntradaySignalAgent::default().with_advisor(Some(handle));
        let signal = run(&agent, &breakout_features()).await;
        assert_eq!(signal.tags, vec!["fallback".to_string()]);
        assert_eq!(signal.confidence, ENTER_CONFIDENCE);
    }

    #[tokio::test]
    async fn valid_advisor_reply_wins() {
        let reply = r#"{"action": "skip", "confidence": 0.2, "reason": "news event ahead"}"#;
        let handle = AdvisorHandle::new(Arc::new(StaticAdvisor::new(reply)), Duration::from_secs(1));
        let agent = IntradaySignalAgent::default().with_advisor(Some(handle));
        let signal = run(&agent, &breakout_features()).await;
        assert_eq!(signal.action, SignalAction::Skip);
        assert_eq!(signal.confidence, 0.2);
        assert_eq!(signal.reason, "news event ahead");
    }
}
