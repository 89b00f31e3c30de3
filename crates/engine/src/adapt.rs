// In crates/engine/src/adapt.rs

//! Per-cycle parameter adaptation. Every function here returns a new value
//! and leaves its inputs alone.

use std::collections::BTreeMap;

use app_config::ScenarioProfile;
use core_types::{AccountState, Scenario, round_dp};
use features::SummaryStats;
use risk::RiskParameters;
use strategies::{AgentThresholds, IntradayThresholds, SwingThresholds};

pub type Adjustments = BTreeMap<String, f64>;

pub const ATR_MULTIPLIER: &str = "atr_multiplier";
pub const RISK_PER_TRADE: &str = "risk_per_trade";
pub const RVOL_THRESHOLD: &str = "rvol_threshold";
pub const MAX_POSITION: &str = "max_position";
pub const DONCHIAN_HIGH: &str = "donchian_high";
pub const DONCHIAN_LOW: &str = "donchian_low";

/// Lowest ATR multiplier a cycle will size stops with.
pub const MIN_ATR_MULTIPLIER: f64 = 0.5;

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// A risk fraction usable as-is: positive, at most the whole balance.
fn risk_fraction(value: Option<f64>) -> Option<f64> {
    positive(value).map(|v| v.min(1.0))
}

/// Later maps win on key collisions.
pub fn merge_adjustments(base: &Adjustments, overrides: &Adjustments) -> Adjustments {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
    merged
}

/// Risk settings a cycle starts with, before any volatility nudges.
pub fn baseline_risk_parameters(
    profile: &ScenarioProfile,
    account: &AccountState,
    adjustments: &Adjustments,
) -> RiskParameters {
    let balance = account
        .account_balance
        .filter(|b| *b > 0.0)
        .unwrap_or(profile.default_balance);
    let risk_per_trade = risk_fraction(adjustments.get(RISK_PER_TRADE).copied())
        .or(risk_fraction(account.risk_per_trade))
        .unwrap_or(profile.base_risk_per_trade);
    let max_position = positive(adjustments.get(MAX_POSITION).copied())
        .or(positive(account.max_position))
        .unwrap_or(profile.max_position)
        .max(profile.min_position);

    RiskParameters {
        account_balance: balance,
        risk_per_trade,
        contract_size: profile.contract_size,
        min_position: profile.min_position,
        max_position: Some(max_position),
        reward_risk: profile.reward_risk,
        atr_multiplier: profile.atr_multiplier,
    }
}

/// Applies the risk-related adjustment keys. The risk-per-trade floor is
/// tighter for swing trading. Values that would make sizing impossible are
/// ignored or clamped.
pub fn adjust_risk_parameters(
    params: &RiskParameters,
    adjustments: &Adjustments,
    scenario: Scenario,
) -> RiskParameters {
    let floor = match scenario {
        Scenario::Intraday => 0.001,
        Scenario::Swing => 0.002,
    };
    let mut next = params.clone();
    if let Some(rpt) = risk_fraction(adjustments.get(RISK_PER_TRADE).copied()) {
        next.risk_per_trade = rpt.max(floor);
    }
    if let Some(max_position) = positive(adjustments.get(MAX_POSITION).copied()) {
        next.max_position = Some(max_position.max(next.min_position));
    }
    if let Some(multiplier) = adjustments.get(ATR_MULTIPLIER).filter(|m| m.is_finite()) {
        next.atr_multiplier = multiplier.max(MIN_ATR_MULTIPLIER);
    }
    next
}

/// Volatility and volume nudges for the scenario the thresholds belong to.
pub fn derive_nudges(stats: &SummaryStats, thresholds: &AgentThresholds, params: &RiskParameters) -> Adjustments {
    match thresholds {
        AgentThresholds::Intraday(t) => intraday_nudges(stats, t, params),
        AgentThresholds::Swing(t) => swing_nudges(stats, t, params),
    }
}

pub fn intraday_nudges(stats: &SummaryStats, thresholds: &IntradayThresholds, params: &RiskParameters) -> Adjustments {
    let mut nudges = Adjustments::new();

    if let (Some(recent), Some(mean)) = (nonzero(stats.atr_recent), nonzero(stats.atr_mean)) {
        let ratio = (recent / mean).clamp(0.5, 3.0);
        nudges.insert(
            ATR_MULTIPLIER.to_string(),
            round_dp((thresholds.atr_multiplier * ratio).clamp(1.0, 3.5), 2),
        );
        nudges.insert(
            RISK_PER_TRADE.to_string(),
            round_dp((params.risk_per_trade / ratio).clamp(0.002, 0.02), 4),
        );
    }

    if let Some(rvol) = nonzero(stats.rvol_recent) {
        nudges.insert(
            RVOL_THRESHOLD.to_string(),
            round_dp(((rvol + thresholds.rvol_threshold) / 2.0).clamp(1.0, 3.5), 2),
        );
    }
    nudges
}

pub fn swing_nudges(stats: &SummaryStats, thresholds: &SwingThresholds, params: &RiskParameters) -> Adjustments {
    let mut nudges = Adjustments::new();

    if let (Some(recent), Some(mean)) = (nonzero(stats.atr_recent), nonzero(stats.atr_mean)) {
        let ratio = (recent / mean).clamp(0.5, 2.5);
        nudges.insert(
            ATR_MULTIPLIER.to_string(),
            round_dp((thresholds.atr_multiplier * ratio).clamp(1.0, 4.0), 2),
        );
        nudges.insert(
            RISK_PER_TRADE.to_string(),
            round_dp((params.risk_per_trade / ratio.max(0.75)).clamp(0.003, 0.03), 4),
        );
        nudges.insert(
            DONCHIAN_HIGH.to_string(),
            (f64::from(thresholds.donchian_high) * ratio).floor().max(30.0),
        );
        nudges.insert(
            DONCHIAN_LOW.to_string(),
            (f64::from(thresholds.donchian_low) * ratio).floor().max(15.0),
        );
    }

    // Swing volume nudges pull toward a fixed 1.5 rather than the current threshold.
    if let Some(rvol) = nonzero(stats.rvol_recent) {
        nudges.insert(
            RVOL_THRESHOLD.to_string(),
            round_dp(((rvol + 1.5) / 2.0).clamp(1.0, 3.0), 2),
        );
    }
    nudges
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(atr_recent: f64, atr_mean: f64, rvol_recent: f64) -> SummaryStats {
        SummaryStats {
            atr_mean: Some(atr_mean),
            atr_recent: Some(atr_recent),
            rvol_mean: Some(1.0),
            rvol_recent: Some(rvol_recent),
        }
    }

    #[test]
    fn intraday_volatility_spike_widens_stops_and_cuts_risk() {
        let params = RiskParameters { risk_per_trade: 0.01, ..Default::default() };
        let nudges = intraday_nudges(&stats(2.0, 1.0, 3.0), &IntradayThresholds::default(), &params);
        assert_relative_eq!(nudges[ATR_MULTIPLIER], 3.0);
        assert_relative_eq!(nudges[RISK_PER_TRADE], 0.005);
        assert_relative_eq!(nudges[RVOL_THRESHOLD], 2.4);
    }

    #[test]
    fn intraday_ratio_is_clamped() {
        let params = RiskParameters { risk_per_trade: 0.01, ..Default::default() };
        let nudges = intraday_nudges(&stats(10.0, 1.0, 9.0), &IntradayThresholds::default(), &params);
        // Ratio caps at 3.0, so the multiplier hits its 3.5 ceiling.
        assert_relative_eq!(nudges[ATR_MULTIPLIER], 3.5);
        assert_relative_eq!(nudges[RISK_PER_TRADE], 0.0033);
        assert_relative_eq!(nudges[RVOL_THRESHOLD], 3.5);
    }

    #[test]
    fn swing_nudges_scale_the_breakout_windows() {
        let params = RiskParameters { risk_per_trade: 0.008, ..Default::default() };
        let nudges = swing_nudges(&stats(0.5, 1.0, 1.1), &SwingThresholds::default(), &params);
        assert_relative_eq!(nudges[ATR_MULTIPLIER], 1.0);
        // Ratio 0.5 is floored to 0.75 when scaling risk.
        assert_relative_eq!(nudges[RISK_PER_TRADE], 0.0107);
        assert_relative_eq!(nudges[DONCHIAN_HIGH], 30.0);
        assert_relative_eq!(nudges[DONCHIAN_LOW], 15.0);
        assert_relative_eq!(nudges[RVOL_THRESHOLD], 1.3);
    }

    #[test]
    fn missing_or_zero_stats_produce_no_nudges() {
        let params = RiskParameters::default();
        assert!(intraday_nudges(&SummaryStats::default(), &IntradayThresholds::default(), &params).is_empty());
        let flat = SummaryStats { atr_mean: Some(0.0), atr_recent: Some(1.0), ..Default::default() };
        assert!(swing_nudges(&flat, &SwingThresholds::default(), &params).is_empty());
    }

    #[test]
    fn later_adjustments_win() {
        let base = Adjustments::from([(RISK_PER_TRADE.to_string(), 0.01), (RVOL_THRESHOLD.to_string(), 2.0)]);
        let nudges = Adjustments::from([(RISK_PER_TRADE.to_string(), 0.005)]);
        let merged = merge_adjustments(&base, &nudges);
        assert_eq!(merged[RISK_PER_TRADE], 0.005);
        assert_eq!(merged[RVOL_THRESHOLD], 2.0);
    }

    #[test]
    fn baseline_prefers_adjustments_then_account_then_profile() {
        let profile = ScenarioProfile::intraday();
        let account = AccountState { risk_per_trade: Some(0.02), max_position: Some(3.0), ..Default::default() };

        let params = baseline_risk_parameters(&profile, &account, &Adjustments::new());
        assert_eq!(params.account_balance, 10_000.0);
        assert_eq!(params.risk_per_trade, 0.02);
        assert_eq!(params.max_position, Some(3.0));

        let adjustments = Adjustments::from([(RISK_PER_TRADE.to_string(), 0.005)]);
        let params = baseline_risk_parameters(&profile, &AccountState::with_balance(4000.0), &adjustments);
        assert_eq!(params.account_balance, 4000.0);
        assert_eq!(params.risk_per_trade, 0.005);
        assert_eq!(params.max_position, Some(5.0));
    }

    #[test]
    fn risk_adjustment_respects_the_scenario_floor() {
        let adjustments = Adjustments::from([
            (RISK_PER_TRADE.to_string(), 0.0001),
            (ATR_MULTIPLIER.to_string(), 2.25),
        ]);
        let params = RiskParameters::default();
        let intraday = adjust_risk_parameters(&params, &adjustments, Scenario::Intraday);
        assert_eq!(intraday.risk_per_trade, 0.001);
        assert_eq!(intraday.atr_multiplier, 2.25);
        let swing = adjust_risk_parameters(&params, &adjustments, Scenario::Swing);
        assert_eq!(swing.risk_per_trade, 0.002);
        assert_eq!(params, RiskParameters::default());
    }

    #[test]
    fn unusable_adjustments_cannot_break_sizing() {
        let adjustments = Adjustments::from([
            (RISK_PER_TRADE.to_string(), 3.0),
            (MAX_POSITION.to_string(), 0.0),
            (ATR_MULTIPLIER.to_string(), -1.0),
        ]);
        let params = RiskParameters { max_position: Some(5.0), ..Default::default() };
        let next = adjust_risk_parameters(&params, &adjustments, Scenario::Intraday);
        assert_eq!(next.risk_per_trade, 1.0);
        assert_eq!(next.max_position, Some(5.0));
        assert_eq!(next.atr_multiplier, MIN_ATR_MULTIPLIER);

        let tiny = Adjustments::from([(MAX_POSITION.to_string(), 0.001), (RISK_PER_TRADE.to_string(), -0.5)]);
        let next = adjust_risk_parameters(&params, &tiny, Scenario::Swing);
        assert_eq!(next.max_position, Some(params.min_position));
        assert_eq!(next.risk_per_trade, params.risk_per_trade);
    }

    #[test]
    fn baseline_ignores_unusable_adjustments() {
        let profile = ScenarioProfile::intraday();
        let adjustments = Adjustments::from([
            (RISK_PER_TRADE.to_string(), 0.0),
            (MAX_POSITION.to_string(), -2.0),
        ]);
        let account = AccountState { risk_per_trade: Some(1.5), ..AccountState::with_balance(4000.0) };
        let params = baseline_risk_parameters(&profile, &account, &adjustments);
        assert_eq!(params.risk_per_trade, 1.0);
        assert_eq!(params.max_position, Some(profile.max_position));
    }
}
