// In crates/core-types/src/signal.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{FeatureRow, MarketRegime, Side, SignalAction, Symbol, Timeframe};

/// Shortest reason text a signal may carry.
pub const MIN_REASON_LEN: usize = 10;

/// A trade decision produced once per cycle by a signal agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub action: SignalAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_amount: Option<f64>,
    pub reason: String,
    #[serde(default)]
    pub indicators: FeatureRow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_regime: Option<MarketRegime>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    /// Creates a bare signal; every optional field starts empty.
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        action: SignalAction,
        confidence: f64,
        reason: &str,
    ) -> Self {
        Self {
            id: None,
            symbol,
            timeframe,
            action,
            side: None,
            confidence: clamp_unit(confidence),
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            quantity: None,
            risk_amount: None,
            reason: ensure_reason(reason),
            indicators: FeatureRow::default(),
            market_regime: None,
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Only an entry needs risk management and an execution plan.
    pub fn requires_management(&self) -> bool {
        self.action == SignalAction::Enter
    }

    /// Backfills a missing entry price from the latest close and a missing stop
    /// one ATR away from the entry, against the signal's side.
    pub fn apply_feature_defaults(&mut self, features: &FeatureRow) {
        if self.entry_price.is_none() {
            self.entry_price = features.close;
        }
        if self.stop_loss.is_some() {
            return;
        }
        if let (Some(side), Some(entry), Some(atr)) = (self.side, self.entry_price, features.atr) {
            if atr != 0.0 && entry != 0.0 {
                self.stop_loss = Some(entry - side.direction() * atr);
            }
        }
    }

    /// Checks the field ranges a well-formed signal must respect.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidSignal(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        for (name, value) in [
            ("entry_price", self.entry_price),
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
            ("risk_amount", self.risk_amount),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(Error::InvalidSignal(format!("{name} must be non-negative, got {v}")));
                }
            }
        }
        if let Some(q) = self.quantity {
            if !q.is_finite() || q <= 0.0 {
                return Err(Error::InvalidSignal(format!("quantity must be positive, got {q}")));
            }
        }
        if self.reason.chars().count() < MIN_REASON_LEN {
            return Err(Error::InvalidSignal("reason is too short".to_string()));
        }
        Ok(())
    }
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Pads a short reason so it always satisfies [`MIN_REASON_LEN`].
pub fn ensure_reason(text: &str) -> String {
    let cleaned = text.trim();
    if cleaned.chars().count() >= MIN_REASON_LEN {
        return cleaned.to_string();
    }
    let mut padded = format!("{cleaned} decision.").trim_start().to_string();
    while padded.chars().count() < MIN_REASON_LEN {
        padded.push('.');
    }
    padded
}
