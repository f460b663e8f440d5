use async_trait::async_trait;

use crate::{DigestError, NewsItem, PriceBar};

/// Supplies a daily OHLCV series for a ticker, oldest bar first.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn daily_series(&self, ticker: &str) -> Result<Vec<PriceBar>, DigestError>;
}

/// Supplies recent news headlines for a ticker.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn latest_headlines(&self, ticker: &str) -> Result<Vec<NewsItem>, DigestError>;
}

/// Turns an assembled report prompt into narrative prose.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, prompt: &str) -> Result<String, DigestError>;
}
