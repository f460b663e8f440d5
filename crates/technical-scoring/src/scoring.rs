use chrono::NaiveDate;
use digest_core::{DigestError, PriceBar, Recommendation, ScoreRecord};

use crate::engine::{snapshot, IndicatorSnapshot};

/// RSI thresholds. Deeply oversold scores positive: the signal is a buy on
/// the anticipated bounce, not a warning.
pub fn rsi_score(rsi: f64) -> i32 {
    if rsi <= 20.0 {
        2
    } else if rsi <= 30.0 {
        1
    } else if rsi < 70.0 {
        0
    } else if rsi < 80.0 {
        -1
    } else {
        -2
    }
}

/// Score the line/signal gap against the historical histogram spread.
///
/// The branches overlap and are resolved by first match, so their order is
/// load-bearing: a small positive gap takes the `> 0` branch before the
/// near-zero check ever runs.
pub fn macd_score(line: f64, signal: f64, hist_std: f64) -> i32 {
    let diff = line - signal;
    if diff >= hist_std {
        2
    } else if diff > 0.0 {
        1
    } else if diff.abs() < 0.01 {
        0
    } else if diff > -hist_std {
        -1
    } else {
        -2
    }
}

/// Score the price's average relative distance from the 50 and 200 day
/// moving averages.
pub fn ma_score(price: f64, ma50: f64, ma200: f64) -> i32 {
    let diff50 = (price - ma50) / ma50;
    let diff200 = (price - ma200) / ma200;
    let avg_diff = (diff50 + diff200) / 2.0;

    if avg_diff >= 0.05 {
        2
    } else if avg_diff > 0.0 {
        1
    } else if avg_diff >= -0.05 {
        0
    } else if avg_diff > -0.10 {
        -1
    } else {
        -2
    }
}

fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

fn missing(ticker: &str, what: &str) -> DigestError {
    DigestError::InsufficientData(format!("{}: not enough history for {}", ticker, what))
}

/// Build the complete record for the last bar of a series.
pub fn score_series(ticker: &str, bars: &[PriceBar]) -> Result<ScoreRecord, DigestError> {
    let last = bars
        .last()
        .ok_or_else(|| DigestError::InvalidData(format!("{}: empty price series", ticker)))?;
    let snap = snapshot(bars);
    score_snapshot(ticker, last.date, last.close, &snap)
}

/// Map a snapshot to atomic scores, fold them into the technical and total
/// composites, and label everything. A record requires all three atomic
/// scores; any indicator still absent is an insufficient-data error the
/// batch loop downgrades to a skip.
pub fn score_snapshot(
    ticker: &str,
    date: NaiveDate,
    price: f64,
    snap: &IndicatorSnapshot,
) -> Result<ScoreRecord, DigestError> {
    let rsi = snap.rsi14.ok_or_else(|| missing(ticker, "RSI(14)"))?;
    let (line, signal, hist_std) = match (snap.macd_line, snap.macd_signal, snap.hist_std) {
        (Some(l), Some(s), Some(h)) => (l, s, h),
        _ => return Err(missing(ticker, "MACD(12,26,9)")),
    };
    let (ma50, ma200) = match (snap.ma50, snap.ma200) {
        (Some(short), Some(long)) => (short, long),
        _ => return Err(missing(ticker, "MA50/MA200")),
    };

    let score_rsi = rsi_score(rsi);
    let score_macd = macd_score(line, signal, hist_std);
    let score_ma = ma_score(price, ma50, ma200);
    let tech_score = (score_rsi + score_macd) as f64 / 2.0;
    let total_score = (tech_score + score_ma as f64) / 2.0;

    Ok(ScoreRecord {
        ticker: ticker.to_string(),
        date,
        rsi_score: score_rsi,
        macd_score: score_macd,
        ma_score: score_ma,
        tech_score,
        total_score,
        rsi_label: Recommendation::from_score(score_rsi as f64),
        macd_label: Recommendation::from_score(score_macd as f64),
        ma_label: Recommendation::from_score(score_ma as f64),
        tech_label: Recommendation::from_score(tech_score),
        total_label: Recommendation::from_score(total_score),
        price: round_price(price),
    })
}
