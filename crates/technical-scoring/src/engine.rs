use digest_core::stats::sample_std_dev;
use digest_core::PriceBar;

use crate::indicators::{macd, rsi, sma_last};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const MA_SHORT: usize = 50;
pub const MA_LONG: usize = 200;

/// Indicator values for the most recent bar of a series.
///
/// Each field is either fully computed or None when the series is shorter
/// than that indicator's window; nothing is ever partially filled.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSnapshot {
    pub rsi14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    /// Sample standard deviation of the full line-minus-signal histogram.
    pub hist_std: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
}

/// Compute the snapshot for the last bar of an ascending-date series.
/// Never fails: indicators whose window exceeds the series length come back
/// as None and callers decide whether to skip.
pub fn snapshot(bars: &[PriceBar]) -> IndicatorSnapshot {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let mut snap = IndicatorSnapshot {
        rsi14: rsi(&closes, RSI_PERIOD),
        ma50: sma_last(&closes, MA_SHORT),
        ma200: sma_last(&closes, MA_LONG),
        ..Default::default()
    };

    if closes.len() >= MACD_SLOW {
        let series = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        snap.macd_line = series.line.last().copied();
        // The signal line needs its own span of macd history on top of the
        // slow EMA before it is meaningful.
        if closes.len() >= MACD_SLOW + MACD_SIGNAL {
            snap.macd_signal = series.signal.last().copied();
            snap.hist_std = Some(sample_std_dev(&series.histogram));
        }
    }

    snap
}
