// In crates/core-types/src/trade.rs

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{OrderType, Side, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    #[default]
    Pending,
    Open,
    Closed,
    Cancelled,
}

/// A sized and bracketed trade, ready to be handed to an order router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub side: Side,
    pub entry_price: f64,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    pub status: TradeStatus,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_amount: Option<f64>,
}

/// Fields needed to build a [`Trade`]; `Trade::try_from` enforces the invariants.
#[derive(Debug, Clone, Default)]
pub struct TradeDraft {
    pub symbol: Symbol,
    pub side: Option<Side>,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub comment: String,
    pub signal_id: Option<String>,
    pub risk_amount: Option<f64>,
}

impl TryFrom<TradeDraft> for Trade {
    type Error = Error;

    fn try_from(draft: TradeDraft) -> Result<Self> {
        let side = draft
            .side
            .ok_or_else(|| Error::InvalidTrade("trade side is required".to_string()))?;
        if !draft.entry_price.is_finite() || draft.entry_price <= 0.0 {
            return Err(Error::InvalidTrade(format!(
                "entry price must be positive, got {}",
                draft.entry_price
            )));
        }
        if !draft.quantity.is_finite() || draft.quantity <= 0.0 {
            return Err(Error::InvalidTrade(format!(
                "quantity must be positive, got {}",
                draft.quantity
            )));
        }
        if let Some(stop) = draft.stop_loss {
            if stop < 0.0 {
                return Err(Error::InvalidTrade(format!("stop loss must be non-negative, got {stop}")));
            }
            let behind = match side {
                Side::Buy => stop < draft.entry_price,
                Side::Sell => stop > draft.entry_price,
            };
            if !behind {
                return Err(Error::InvalidStopLoss { side, entry_price: draft.entry_price, stop_loss: stop });
            }
        }
        if let Some(take) = draft.take_profit {
            let beyond = match side {
                Side::Buy => take > draft.entry_price,
                Side::Sell => take < draft.entry_price,
            };
            if !beyond {
                return Err(Error::InvalidTakeProfit {
                    side,
                    entry_price: draft.entry_price,
                    take_profit: take,
                });
            }
        }

        Ok(Trade {
            symbol: draft.symbol,
            side,
            entry_price: draft.entry_price,
            quantity: draft.quantity,
            stop_loss: draft.stop_loss,
            take_profit: draft.take_profit,
            status: TradeStatus::Pending,
            comment: draft.comment,
            signal_id: draft.signal_id,
            risk_amount: draft.risk_amount,
        })
    }
}

/// An instruction for an order router. Limit and stop orders carry a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: f64,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    pub comment: String,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<()> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(Error::InvalidOrder(format!("quantity must be positive, got {}", self.quantity)));
        }
        match (self.order_type, self.price) {
            (OrderType::Market, _) => Ok(()),
            (_, Some(price)) if price > 0.0 => Ok(()),
            (kind, _) => Err(Error::InvalidOrder(format!("{kind:?} orders require a positive price"))),
        }
    }
}

/// A live top-of-book snapshot. Only the execution planner reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid_price: Option<f64>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl Quote {
    /// The stated mid price, or the bid/ask midpoint when both sides are known.
    pub fn mid(&self) -> Option<f64> {
        positive(self.mid_price).or_else(|| match (positive(self.bid), positive(self.ask)) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            _ => None,
        })
    }

    /// The price a market order on `side` would fill at: ask for a buy, bid for
    /// a sell, then the mid, then whatever the opposite side shows.
    pub fn price_for(&self, side: Side) -> Option<f64> {
        let (near, far) = match side {
            Side::Buy => (self.ask, self.bid),
            Side::Sell => (self.bid, self.ask),
        };
        positive(near).or_else(|| self.mid()).or_else(|| positive(far))
    }
}
