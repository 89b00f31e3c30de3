// In crates/features/src/indicators.rs

use core_types::Bar;
use ta::Next;
use ta::indicators::{
    ExponentialMovingAverage as Ema, Maximum, Minimum, SimpleMovingAverage as Sma,
};

use crate::{Error, Result};

/// An OHLCV field an indicator may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    Close,
    High,
    Low,
    Volume,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Close => "close",
            Column::High => "high",
            Column::Low => "low",
            Column::Volume => "volume",
        }
    }

    fn get(self, bar: &Bar) -> Option<f64> {
        match self {
            Column::Close => bar.close,
            Column::High => bar.high,
            Column::Low => bar.low,
            Column::Volume => bar.volume,
        }
    }
}

/// Fails with `MissingColumns` naming every required field that is absent on
/// at least one bar.
pub fn require_columns(bars: &[Bar], required: &[Column]) -> Result<()> {
    let mut missing: Vec<Column> = required
        .iter()
        .copied()
        .filter(|col| bars.iter().any(|bar| col.get(bar).is_none()))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(Error::MissingColumns(missing.into_iter().map(Column::name).collect()))
}

/// Extracts one column. Call `require_columns` first; absent values read as 0.
pub fn column(bars: &[Bar], col: Column) -> Vec<f64> {
    bars.iter().map(|bar| col.get(bar).unwrap_or(0.0)).collect()
}

fn check_period(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidParameter { name, value });
    }
    Ok(())
}

/// Exponential moving average with `alpha = 2 / (period + 1)`, seeded with the
/// first input.
pub fn ema(series: &[f64], period: usize) -> Result<Vec<f64>> {
    check_period("period", period)?;
    let mut ema = Ema::new(period).map_err(|_| Error::InvalidParameter { name: "period", value: period })?;
    Ok(series.iter().map(|v| ema.next(*v)).collect())
}

/// Average True Range as the rolling mean of the true range.
///
/// The first bar has no previous close, so its true range is `high - low`.
/// Windows shorter than `period` at the start of the series average whatever
/// is available.
pub fn atr(bars: &[Bar], period: usize) -> Result<Vec<f64>> {
    check_period("period", period)?;
    require_columns(bars, &[Column::High, Column::Low, Column::Close])?;

    let highs = column(bars, Column::High);
    let lows = column(bars, Column::Low);
    let closes = column(bars, Column::Close);

    let mut sma = Sma::new(period).map_err(|_| Error::InvalidParameter { name: "period", value: period })?;
    let atr = (0..bars.len())
        .map(|i| {
            let range = (highs[i] - lows[i]).abs();
            let tr = if i == 0 {
                range
            } else {
                range
                    .max((highs[i] - closes[i - 1]).abs())
                    .max((lows[i] - closes[i - 1]).abs())
            };
            sma.next(tr)
        })
        .collect();
    Ok(atr)
}

/// Volume divided by its rolling mean. Undefined ratios (zero mean) become 0.
pub fn relative_volume(volumes: &[f64], window: usize) -> Result<Vec<f64>> {
    check_period("window", window)?;
    let mut sma = Sma::new(window).map_err(|_| Error::InvalidParameter { name: "window", value: window })?;
    Ok(volumes
        .iter()
        .map(|v| {
            let mean = sma.next(*v);
            let rvol = v / mean;
            if rvol.is_finite() { rvol } else { 0.0 }
        })
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonchianChannels {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub middle: Vec<f64>,
}

/// Rolling highest high and lowest low over `period` bars.
pub fn donchian_channels(bars: &[Bar], period: usize) -> Result<DonchianChannels> {
    check_period("period", period)?;
    require_columns(bars, &[Column::High, Column::Low])?;

    let mut max = Maximum::new(period).map_err(|_| Error::InvalidParameter { name: "period", value: period })?;
    let mut min = Minimum::new(period).map_err(|_| Error::InvalidParameter { name: "period", value: period })?;

    let mut channels = DonchianChannels {
        upper: Vec::with_capacity(bars.len()),
        lower: Vec::with_capacity(bars.len()),
        middle: Vec::with_capacity(bars.len()),
    };
    for (high, low) in column(bars, Column::High).into_iter().zip(column(bars, Column::Low)) {
        let upper = max.next(high);
        let lower = min.next(low);
        channels.upper.push(upper);
        channels.lower.push(lower);
        channels.middle.push((upper + lower) / 2.0);
    }
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars(rows: &[(f64, f64, f64)]) -> Vec<Bar> {
        rows.iter()
            .map(|&(high, low, close)| Bar::new(close, high, low, close, 100.0))
            .collect()
    }

    #[test]
    fn ema_seeds_with_first_value() {
        let out = ema(&[10.0, 20.0, 30.0], 3).unwrap();
        // alpha = 0.5
        assert_relative_eq!(out[0], 10.0);
        assert_relative_eq!(out[1], 15.0);
        assert_relative_eq!(out[2], 22.5);
    }

    #[test]
    fn zero_periods_are_rejected() {
        assert!(matches!(ema(&[1.0], 0), Err(Error::InvalidParameter { .. })));
        assert!(matches!(relative_volume(&[1.0], 0), Err(Error::InvalidParameter { name: "window", .. })));
        assert!(atr(&bars(&[(2.0, 1.0, 1.5)]), 0).is_err());
        assert!(donchian_channels(&bars(&[(2.0, 1.0, 1.5)]), 0).is_err());
    }

    #[test]
    fn atr_uses_previous_close_after_the_first_bar() {
        let series = bars(&[(11.0, 9.0, 10.0), (14.0, 12.0, 13.0), (13.5, 12.5, 13.0)]);
        let out = atr(&series, 14).unwrap();
        // TR: 2.0, then max(2, |14-10|, |12-10|) = 4, then max(1, 0.5, 0.5) = 1
        assert_relative_eq!(out[0], 2.0);
        assert_relative_eq!(out[1], 3.0);
        assert_relative_eq!(out[2], 7.0 / 3.0);
    }

    #[test]
    fn atr_reports_missing_columns() {
        let mut series = bars(&[(11.0, 9.0, 10.0)]);
        series[0].close = None;
        series[0].low = None;
        assert_eq!(atr(&series, 14), Err(Error::MissingColumns(vec!["close", "low"])));
    }

    #[test]
    fn relative_volume_zero_mean_becomes_zero() {
        let out = relative_volume(&[0.0, 0.0, 300.0], 20).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 3.0);
    }

    #[test]
    fn donchian_tracks_the_rolling_extremes() {
        let series = bars(&[(5.0, 1.0, 3.0), (4.0, 2.0, 3.0), (3.0, 2.5, 3.0)]);
        let channels = donchian_channels(&series, 2).unwrap();
        assert_eq!(channels.upper, vec![5.0, 5.0, 4.0]);
        assert_eq!(channels.lower, vec![1.0, 1.0, 2.0]);
        assert_relative_eq!(channels.middle[2], 3.0);
    }
}
