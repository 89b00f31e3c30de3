// In crates/strategies/src/parse.rs

//! Strict reading of an advisor's trade decision.

use advisor::{Error, Result, first_present, number, string_list};
use core_types::{Side, Signal, SignalAction, clamp_unit};
use serde_json::{Map, Value};

use crate::SignalContext;

/// Per-agent defaults for fields the advisor leaves out.
pub(crate) struct DecisionDefaults {
    pub confidence: f64,
    pub reason: &'static str,
}

fn optional_price(map: &Map<String, Value>, keys: &[&str]) -> Result<Option<f64>> {
    match first_present(map, keys) {
        None => Ok(None),
        Some(value) => number(value)
            .map(Some)
            .ok_or_else(|| Error::Malformed(format!("{} is not a number: {value}", keys[0]))),
    }
}

/// Builds a signal from the advisor's JSON object.
///
/// Unknown actions read as SKIP and unknown sides as no side. Anything that
/// makes the resulting signal invalid (negative prices, a zero quantity) is
/// reported as a malformed reply so the caller can fall back.
pub(crate) fn parse_decision(
    map: &Map<String, Value>,
    ctx: &SignalContext<'_>,
    defaults: &DecisionDefaults,
) -> Result<Signal> {
    let action = map
        .get("action")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<SignalAction>().ok())
        .unwrap_or(SignalAction::Skip);
    let side = map
        .get("side")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Side>().ok());

    let attachments = match map.get("attachments") {
        Some(Value::Object(items)) => Some(items),
        _ => None,
    };

    let confidence = first_present(map, &["confidence"])
        .or_else(|| attachments.and_then(|a| first_present(a, &["confidence"])))
        .and_then(number)
        .unwrap_or(defaults.confidence);

    let reason = attachments
        .and_then(|a| a.get("reason"))
        .or_else(|| map.get("reason"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.reason);

    let mut signal = Signal::new(ctx.symbol.clone(), ctx.timeframe, action, clamp_unit(confidence), reason);
    signal.side = side;
    signal.entry_price = optional_price(map, &["entry", "entry_price"])?;
    signal.stop_loss = optional_price(map, &["sl", "stop_loss"])?;
    signal.take_profit = optional_price(map, &["tp", "take_profit"])?;
    signal.quantity = optional_price(map, &["size", "quantity"])?;
    signal.risk_amount = attachments.and_then(|a| a.get("risk_amount")).and_then(number);
    signal.tags = string_list(attachments.and_then(|a| a.get("tags")));
    signal.indicators = ctx.features.clone();
    signal.market_regime = ctx.market_regime();

    signal
        .validate()
        .map_err(|err| Error::Malformed(err.to_string()))?;
    Ok(signal)
}
