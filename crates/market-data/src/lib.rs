use async_trait::async_trait;
use chrono::{DateTime, Utc};
use digest_core::{DigestError, NewsItem, NewsSource, PriceBar, PriceSource};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Requests per minute against the quote host. Yahoo throttles aggressively
/// on burst traffic, so the batch paces itself instead of racing.
const DEFAULT_RATE_LIMIT: usize = 30;
const NEWS_COUNT: usize = 10;

/// Sliding-window rate limiter: at most `max_requests` per `window`.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let wait_until = ts.front().unwrap().checked_add(self.window).unwrap();
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for a market-data slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// HTTP client for the Yahoo-style chart and search endpoints.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url,
            client,
            rate_limiter: RateLimiter::new(DEFAULT_RATE_LIMIT, Duration::from_secs(60)),
        }
    }

    /// One year of daily bars, oldest first. Days the endpoint reports with
    /// null fields are dropped whole rather than partially filled.
    pub async fn daily_series(&self, ticker: &str) -> Result<Vec<PriceBar>, DigestError> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .client
            .get(&url)
            .query(&[("range", "1y"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| DigestError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DigestError::Api(format!(
                "HTTP {} fetching series for {}",
                response.status(),
                ticker
            )));
        }

        let parsed: ChartResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Api(e.to_string()))?;

        let result = parsed
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| DigestError::InvalidData(format!("{}: empty chart result", ticker)))?;

        Ok(bars_from_chart(result))
    }

    /// Latest headlines from the search endpoint, capped at NEWS_COUNT.
    pub async fn latest_headlines(&self, ticker: &str) -> Result<Vec<NewsItem>, DigestError> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/v1/finance/search", self.base_url);
        let news_count = NEWS_COUNT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("q", ticker), ("newsCount", &news_count), ("quotesCount", "0")])
            .send()
            .await
            .map_err(|e| DigestError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DigestError::Api(format!(
                "HTTP {} fetching news for {}",
                response.status(),
                ticker
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Api(e.to_string()))?;

        Ok(items_from_search(ticker, parsed))
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn daily_series(&self, ticker: &str) -> Result<Vec<PriceBar>, DigestError> {
        YahooClient::daily_series(self, ticker).await
    }
}

#[async_trait]
impl NewsSource for YahooClient {
    async fn latest_headlines(&self, ticker: &str) -> Result<Vec<NewsItem>, DigestError> {
        YahooClient::latest_headlines(self, ticker).await
    }
}

fn bars_from_chart(result: ChartResult) -> Vec<PriceBar> {
    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return vec![],
    };

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let date = match DateTime::from_timestamp(ts, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, i).unwrap_or(0.0),
        });
    }
    bars
}

fn items_from_search(ticker: &str, parsed: SearchResponse) -> Vec<NewsItem> {
    let mut items = Vec::new();
    for article in parsed.news.into_iter().take(NEWS_COUNT) {
        let title = article.title.unwrap_or_default();
        if title.is_empty() {
            tracing::warn!("Skipping a {} headline without a title", ticker);
            continue;
        }
        let link = match article.link {
            Some(link) if !link.is_empty() => link,
            _ => continue,
        };
        let published_at = article
            .provider_publish_time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        items.push(NewsItem {
            ticker: ticker.to_string(),
            title,
            link,
            published_at,
            sentiment: None,
        });
    }
    items
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Vec<ChartResult>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
struct SearchNews {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "providerPublishTime")]
    provider_publish_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_from_chart_skips_null_days() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1709251200, 1709337600, 1709424000],
                    "indicators": {
                        "quote": [{
                            "open": [10.0, null, 12.0],
                            "high": [11.0, 12.0, 13.0],
                            "low": [9.0, 10.0, 11.0],
                            "close": [10.5, 11.5, 12.5],
                            "volume": [1000.0, 2000.0, null]
                        }]
                    }
                }]
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(raw).unwrap();
        let bars = bars_from_chart(parsed.chart.result.into_iter().next().unwrap());

        // The middle day has a null open and is dropped whole
        assert_eq!(bars.len(), 2);
        assert!((bars[0].close - 10.5).abs() < 1e-9);
        assert!((bars[1].close - 12.5).abs() < 1e-9);
        // Missing volume defaults to zero rather than dropping the bar
        assert_eq!(bars[1].volume, 0.0);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn test_items_from_search_skips_untitled() {
        let raw = r#"{
            "news": [
                {"title": "Shares rally", "link": "https://example.com/a", "providerPublishTime": 1709251200},
                {"title": "", "link": "https://example.com/b", "providerPublishTime": 1709251200},
                {"link": "https://example.com/c"}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        let items = items_from_search("AAPL", parsed);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ticker, "AAPL");
        assert_eq!(items[0].title, "Shares rally");
        assert!(items[0].sentiment.is_none());
    }

    #[test]
    fn test_items_default_publish_time_to_now() {
        let raw = r#"{"news": [{"title": "Dated headline", "link": "https://example.com/d"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        let items = items_from_search("MSFT", parsed);
        assert_eq!(items.len(), 1);
        assert!((Utc::now() - items[0].published_at).num_seconds() < 5);
    }
}
