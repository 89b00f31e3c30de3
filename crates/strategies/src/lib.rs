// In crates/strategies/src/lib.rs

use async_trait::async_trait;
use core_types::{AccountState, FeatureRow, MarketRegime, Signal, Symbol, Timeframe};
use features::SummaryStats;

pub mod error;
pub mod factory;
pub mod intraday;
mod parse;
pub mod swing;
pub mod types;

pub use error::{Error, Result};
pub use factory::create_signal_agent;
pub use intraday::IntradaySignalAgent;
pub use swing::SwingSignalAgent;
pub use types::{AgentThresholds, IntradayThresholds, SwingThresholds};

/// Everything a signal agent may look at when deciding.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub symbol: &'a Symbol,
    pub timeframe: Timeframe,
    /// The latest enriched bar. Empty when no market data was available.
    pub features: &'a FeatureRow,
    pub stats: &'a SummaryStats,
    pub account: &'a AccountState,
}

impl SignalContext<'_> {
    /// The account's regime label, if it names a known regime.
    pub fn market_regime(&self) -> Option<MarketRegime> {
        self.account.market_regime.as_deref().and_then(|r| r.parse().ok())
    }
}

/// The universal interface for a signal agent.
///
/// An agent turns the latest features into exactly one [`Signal`] per call.
/// It may consult an advisor, but must always be able to decide on its own.
#[async_trait]
pub trait SignalAgent: Send + Sync {
    /// The name of the agent.
    fn name(&self) -> &'static str;

    /// Decides what to do with the instrument. Errors only come from risk
    /// sizing; advisor problems are handled internally.
    async fn generate_signal(&self, ctx: &SignalContext<'_>) -> Result<Signal>;
}
