// In crates/execution/src/planner.rs

use chrono::Utc;
use core_types::{Quote, Side, Signal, Trade, TradeDraft};
use risk::{RiskAssessment, RiskManager};
use tracing::{debug, warn};

use crate::types::{ExecutionPlan, ExecutionSettings, PlanMetadata};
use crate::{Error, Result};

/// Turns entry-worthy signals into trade plans.
#[derive(Debug, Clone)]
pub struct ExecutionPlanner {
    risk_manager: RiskManager,
    settings: ExecutionSettings,
}

impl ExecutionPlanner {
    pub fn new(risk_manager: RiskManager) -> Self {
        Self { risk_manager, settings: ExecutionSettings::default() }
    }

    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk_manager
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// A live quote takes precedence over the signal's own price. Without a
    /// usable quote the signal must carry an entry price.
    pub fn resolve_entry_price(&self, signal: &Signal, quote: Option<&Quote>) -> Result<f64> {
        let quoted = quote.and_then(|q| match signal.side {
            Some(side) => q.price_for(side),
            None => q.mid(),
        });
        quoted
            .or(signal.entry_price)
            .ok_or(Error::MissingPrice)
    }

    pub fn create_plan(
        &self,
        signal: &Signal,
        quote: Option<&Quote>,
        atr_value: Option<f64>,
        assessment: Option<RiskAssessment>,
    ) -> Result<ExecutionPlan> {
        let side = signal.side.ok_or(Error::MissingSide)?;
        let entry_price = self.resolve_entry_price(signal, quote)?;

        let assessment = match assessment {
            Some(assessment) => assessment,
            None => {
                let (stop_loss, take_profit) = bracket_for(signal, side, entry_price);
                self.risk_manager
                    .assess_trade(side, entry_price, stop_loss, take_profit, atr_value)?
            }
        };

        let trade = Trade::try_from(TradeDraft {
            symbol: signal.symbol.clone(),
            side: Some(side),
            entry_price,
            quantity: assessment.position_size,
            stop_loss: Some(assessment.stop_loss),
            take_profit: Some(assessment.take_profit),
            comment: signal.reason.clone(),
            signal_id: signal.id.clone(),
            risk_amount: Some(assessment.risk_amount),
        })?;

        debug!(symbol = %trade.symbol, %side, entry_price, quantity = trade.quantity, "Execution plan created");

        Ok(ExecutionPlan {
            trade,
            assessment,
            order_type: self.settings.order_type,
            slippage: self.settings.slippage,
            metadata: PlanMetadata { generated_at: Utc::now(), source_action: signal.action },
        })
    }
}

/// The signal's stop and target, unless the entry was repriced from a quote
/// that moved through either level. Then both are dropped and derived again
/// around the quoted price.
fn bracket_for(signal: &Signal, side: Side, entry_price: f64) -> (Option<f64>, Option<f64>) {
    if signal.entry_price == Some(entry_price) {
        return (signal.stop_loss, signal.take_profit);
    }
    let dir = side.direction();
    let stop_holds = signal.stop_loss.is_none_or(|stop| (entry_price - stop) * dir > 0.0);
    let take_holds = signal.take_profit.is_none_or(|take| (take - entry_price) * dir > 0.0);
    if stop_holds && take_holds {
        return (signal.stop_loss, signal.take_profit);
    }
    warn!(
        symbol = %signal.symbol,
        %side,
        entry_price,
        stop_loss = ?signal.stop_loss,
        take_profit = ?signal.take_profit,
        "Entry moved past the signal's levels; deriving new ones"
    );
    (None, None)
}
