// In crates/core-types/src/lib.rs

pub mod account;
pub mod error;
pub mod signal;
pub mod trade;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use account::{AccountState, CorrelationData, PositionSnapshot};
pub use error::{Error, Result};
pub use signal::{MIN_REASON_LEN, Signal, clamp_unit, ensure_reason};
pub use trade::{OrderRequest, Quote, Trade, TradeDraft, TradeStatus};
pub use types::{
    Bar, FeatureRow, MarketRegime, OrderType, Scenario, Side, SignalAction, Symbol, Timeframe,
    finite, round_dp,
};
