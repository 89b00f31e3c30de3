// In crates/features/src/enrich.rs

use core_types::{Bar, FeatureRow, finite};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::indicators::{Column, atr, column, donchian_channels, ema, relative_volume, require_columns};

/// Lookback settings for the standard indicator set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub atr_period: usize,
    pub rvol_window: usize,
    pub donchian_period: usize,
    /// Number of trailing bars summarized by [`summary_stats`].
    pub stats_window: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ema_fast: 50,
            ema_slow: 200,
            atr_period: 14,
            rvol_window: 20,
            donchian_period: 20,
            stats_window: 30,
        }
    }
}

/// A bar with the standard indicator set attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub atr: f64,
    pub rvol: f64,
    pub donchian_upper: f64,
    pub donchian_lower: f64,
    pub donchian_mid: f64,
}

impl EnrichedBar {
    /// Flattens into a sparse row, dropping anything that is not a finite number.
    pub fn to_feature_row(&self) -> FeatureRow {
        let keep = |v: Option<f64>| v.and_then(finite);
        FeatureRow {
            timestamp: self.bar.timestamp,
            open: keep(self.bar.open),
            high: keep(self.bar.high),
            low: keep(self.bar.low),
            close: keep(self.bar.close),
            volume: keep(self.bar.volume),
            ema_fast: finite(self.ema_fast),
            ema_slow: finite(self.ema_slow),
            atr: finite(self.atr),
            rvol: finite(self.rvol),
            donchian_upper: finite(self.donchian_upper),
            donchian_lower: finite(self.donchian_lower),
            donchian_mid: finite(self.donchian_mid),
        }
    }
}

/// Attaches EMA (fast and slow), ATR, RVOL and Donchian channels to every bar.
pub fn enrich(bars: &[Bar], settings: &IndicatorSettings) -> Result<Vec<EnrichedBar>> {
    require_columns(bars, &[Column::Close, Column::High, Column::Low, Column::Volume])?;

    let closes = column(bars, Column::Close);
    let ema_fast = ema(&closes, settings.ema_fast)?;
    let ema_slow = ema(&closes, settings.ema_slow)?;
    let atr = atr(bars, settings.atr_period)?;
    let rvol = relative_volume(&column(bars, Column::Volume), settings.rvol_window)?;
    let channels = donchian_channels(bars, settings.donchian_period)?;

    Ok(bars
        .iter()
        .enumerate()
        .map(|(i, bar)| EnrichedBar {
            bar: bar.clone(),
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            atr: atr[i],
            rvol: rvol[i],
            donchian_upper: channels.upper[i],
            donchian_lower: channels.lower[i],
            donchian_mid: channels.middle[i],
        })
        .collect())
}

/// Mean and latest value of ATR and RVOL over the trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr_recent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rvol_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rvol_recent: Option<f64>,
}

impl SummaryStats {
    pub fn is_empty(&self) -> bool {
        *self == SummaryStats::default()
    }
}

fn mean_and_last(values: &[f64]) -> (Option<f64>, Option<f64>) {
    let last = values.last().copied().and_then(finite);
    if values.is_empty() {
        return (None, last);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (finite(mean), last)
}

/// Summarizes the last `tail_window` bars of an already enriched series.
pub fn summary_stats(enriched: &[EnrichedBar], tail_window: usize) -> SummaryStats {
    let tail = &enriched[enriched.len().saturating_sub(tail_window)..];
    let atr: Vec<f64> = tail.iter().map(|b| b.atr).collect();
    let rvol: Vec<f64> = tail.iter().map(|b| b.rvol).collect();
    stats_from(&atr, &rvol)
}

fn stats_from(atr: &[f64], rvol: &[f64]) -> SummaryStats {
    let (atr_mean, atr_recent) = mean_and_last(atr);
    let (rvol_mean, rvol_recent) = mean_and_last(rvol);
    SummaryStats { atr_mean, atr_recent, rvol_mean, rvol_recent }
}

/// Computes the volatility statistics straight from raw bars, without
/// building the full enriched series.
fn raw_summary_stats(bars: &[Bar], settings: &IndicatorSettings) -> Result<SummaryStats> {
    require_columns(bars, &[Column::Close, Column::High, Column::Low, Column::Volume])?;
    let atr = atr(bars, settings.atr_period)?;
    let rvol = relative_volume(&column(bars, Column::Volume), settings.rvol_window)?;
    let start = bars.len().saturating_sub(settings.stats_window);
    Ok(stats_from(&atr[start..], &rvol[start..]))
}

/// The enriched series plus its trailing statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub enriched: Vec<EnrichedBar>,
    pub stats: SummaryStats,
}

impl FeatureSet {
    /// The last enriched bar as a sparse row; empty when there are no bars.
    pub fn latest(&self) -> FeatureRow {
        self.enriched.last().map(EnrichedBar::to_feature_row).unwrap_or_default()
    }
}

/// Runs enrichment and the summary statistics as two independent branches
/// over the same bars.
pub fn compute_feature_set(bars: &[Bar], settings: &IndicatorSettings) -> Result<FeatureSet> {
    if bars.is_empty() {
        return Ok(FeatureSet::default());
    }

    let (enriched, stats) = rayon::join(
        || enrich(bars, settings),
        || raw_summary_stats(bars, settings),
    );
    let set = FeatureSet { enriched: enriched?, stats: stats? };
    debug!(bars = bars.len(), stats = ?set.stats, "Feature set computed");
    Ok(set)
}
