// In crates/features/src/lib.rs

//! Technical indicators over OHLCV bars.
//!
//! Every rolling window uses shrinking-window semantics: the first bars of a
//! series are computed over whatever history exists, so outputs always have
//! the same length as the input.

pub mod enrich;
pub mod error;
pub mod indicators;

pub use enrich::{
    EnrichedBar, FeatureSet, IndicatorSettings, SummaryStats, compute_feature_set, enrich,
    summary_stats,
};
pub use error::{Error, Result};
pub use indicators::{Column, DonchianChannels, atr, donchian_channels, ema, relative_volume};
