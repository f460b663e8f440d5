use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for one ticker on one trading day.
///
/// Series are ordered ascending by date; missing trading days are simply
/// absent from the series, never filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A news headline attached to a ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub ticker: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    /// Populated by the sentiment pass; None until scored.
    #[serde(default)]
    pub sentiment: Option<f64>,
}

/// Five-level recommendation shared by atomic and composite scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    StrongSell,
    Sell,
    Neutral,
    Buy,
    StrongBuy,
}

impl Recommendation {
    /// Map a score onto the five levels. Total on all of f64; the boundaries
    /// are exact: -0.5 is still "sell", 1.5 is already "strong buy".
    pub fn from_score(score: f64) -> Self {
        if score <= -1.5 {
            Recommendation::StrongSell
        } else if score <= -0.5 {
            Recommendation::Sell
        } else if score < 0.5 {
            Recommendation::Neutral
        } else if score < 1.5 {
            Recommendation::Buy
        } else {
            Recommendation::StrongBuy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongSell => "strong sell",
            Recommendation::Sell => "sell",
            Recommendation::Neutral => "neutral",
            Recommendation::Buy => "buy",
            Recommendation::StrongBuy => "strong buy",
        }
    }

    /// Parse a stored label back into the enum.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "strong sell" => Some(Recommendation::StrongSell),
            "sell" => Some(Recommendation::Sell),
            "neutral" => Some(Recommendation::Neutral),
            "buy" => Some(Recommendation::Buy),
            "strong buy" => Some(Recommendation::StrongBuy),
            _ => None,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed analysis for a (ticker, day): atomic indicator scores, the
/// composite scores derived from them, their labels, and the closing price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub rsi_score: i32,
    pub macd_score: i32,
    pub ma_score: i32,
    /// mean(rsi_score, macd_score), 0.5 steps in [-2, 2]
    pub tech_score: f64,
    /// mean(tech_score, ma_score)
    pub total_score: f64,
    pub rsi_label: Recommendation,
    pub macd_label: Recommendation,
    pub ma_label: Recommendation,
    pub tech_label: Recommendation,
    pub total_label: Recommendation,
    /// Last close, rounded to 2 decimals.
    pub price: f64,
}

/// An analysis row read back from the store, as the report consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub ticker: String,
    pub analysis_date: DateTime<Utc>,
    pub total_summary: String,
    pub technical_indicators_summary: String,
    pub moving_averages_summary: String,
    pub rsi_action: String,
    pub macd_action: String,
    pub price: f64,
    pub sentiment_avg: Option<f64>,
}
