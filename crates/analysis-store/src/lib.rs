use chrono::{DateTime, Duration, NaiveDate, Utc};
use digest_core::{AnalysisRow, DigestError, NewsItem, ScoreRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

fn db_err(e: impl std::fmt::Display) -> DigestError {
    DigestError::Database(e.to_string())
}

/// SQLite-backed store for analysis rows and news headlines.
#[derive(Clone)]
pub struct AnalysisStore {
    pool: SqlitePool,
}

impl AnalysisStore {
    /// Open (creating if missing) and initialize the schema.
    pub async fn new(database_url: &str) -> Result<Self, DigestError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(db_err)?
            .create_if_missing(true);

        // The batch is a single writer; one connection keeps the
        // check-then-insert day guard race-free.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), DigestError> {
        let schema = include_str!("../schema.sql");

        // sqlx executes one statement at a time
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await.map_err(db_err)?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store one analysis row unless the (ticker, day) pair already has one.
    /// Returns whether a row was written; an existing row is an info-level
    /// skip, not an error.
    pub async fn insert_analysis(
        &self,
        record: &ScoreRecord,
        analysis_date: DateTime<Utc>,
    ) -> Result<bool, DigestError> {
        let day = analysis_date.date_naive();

        let existing = sqlx::query(
            "SELECT id FROM stock_analysis WHERE ticker = ?1 AND date(analysis_date) = ?2",
        )
        .bind(&record.ticker)
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if existing.is_some() {
            tracing::info!(
                "Analysis for {} on {} already stored, skipping",
                record.ticker,
                day
            );
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO stock_analysis (
                analysis_date,
                total_summary,
                technical_indicators_summary,
                moving_averages_summary,
                rsi_action,
                macd_action,
                price,
                ticker
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(analysis_date)
        .bind(record.total_label.as_str())
        .bind(record.tech_label.as_str())
        .bind(record.ma_label.as_str())
        .bind(record.rsi_label.as_str())
        .bind(record.macd_label.as_str())
        .bind(record.price)
        .bind(&record.ticker)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(true)
    }

    /// All analysis rows for one calendar day, ordered by ticker.
    pub async fn analyses_for_day(&self, day: NaiveDate) -> Result<Vec<AnalysisRow>, DigestError> {
        let rows = sqlx::query(
            "SELECT ticker, analysis_date, total_summary, technical_indicators_summary,
                    moving_averages_summary, rsi_action, macd_action, price, sentiment_avg
             FROM stock_analysis
             WHERE date(analysis_date) = ?1
             ORDER BY ticker",
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(AnalysisRow {
                    ticker: row.try_get("ticker").map_err(db_err)?,
                    analysis_date: row.try_get("analysis_date").map_err(db_err)?,
                    total_summary: row.try_get("total_summary").map_err(db_err)?,
                    technical_indicators_summary: row
                        .try_get("technical_indicators_summary")
                        .map_err(db_err)?,
                    moving_averages_summary: row
                        .try_get("moving_averages_summary")
                        .map_err(db_err)?,
                    rsi_action: row.try_get("rsi_action").map_err(db_err)?,
                    macd_action: row.try_get("macd_action").map_err(db_err)?,
                    price: row.try_get("price").map_err(db_err)?,
                    sentiment_avg: row.try_get("sentiment_avg").map_err(db_err)?,
                })
            })
            .collect()
    }

    /// Insert headlines, silently ignoring links already stored.
    /// Returns the number of new rows.
    pub async fn insert_news(&self, items: &[NewsItem]) -> Result<u64, DigestError> {
        let mut inserted = 0;
        for item in items {
            let result = sqlx::query(
                "INSERT INTO news (ticker, title, link, published_at, sentiment)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(link) DO NOTHING",
            )
            .bind(&item.ticker)
            .bind(&item.title)
            .bind(&item.link)
            .bind(item.published_at)
            .bind(item.sentiment)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    /// Headlines whose sentiment has not been scored yet.
    pub async fn unscored_news(&self) -> Result<Vec<(i64, String)>, DigestError> {
        let rows = sqlx::query("SELECT id, title FROM news WHERE sentiment IS NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                Ok((
                    row.try_get::<i64, _>("id").map_err(db_err)?,
                    row.try_get::<String, _>("title").map_err(db_err)?,
                ))
            })
            .collect()
    }

    pub async fn set_news_sentiment(&self, id: i64, sentiment: f64) -> Result<(), DigestError> {
        sqlx::query("UPDATE news SET sentiment = ?1 WHERE id = ?2")
            .bind(sentiment)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Scored sentiment values for a ticker published in the trailing
    /// window `[day - n_days, day]`, both ends inclusive.
    pub async fn window_sentiments(
        &self,
        ticker: &str,
        day: NaiveDate,
        n_days: i64,
    ) -> Result<Vec<f64>, DigestError> {
        let from = day - Duration::days(n_days);
        let rows = sqlx::query(
            "SELECT sentiment FROM news
             WHERE ticker = ?1
               AND sentiment IS NOT NULL
               AND date(published_at) >= ?2
               AND date(published_at) <= ?3",
        )
        .bind(ticker)
        .bind(from)
        .bind(day)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| row.try_get::<f64, _>("sentiment").map_err(db_err))
            .collect()
    }

    /// Write the blended window average onto the day's analysis row.
    pub async fn set_sentiment_avg(
        &self,
        ticker: &str,
        day: NaiveDate,
        avg: f64,
    ) -> Result<(), DigestError> {
        sqlx::query(
            "UPDATE stock_analysis SET sentiment_avg = ?1
             WHERE ticker = ?2 AND date(analysis_date) = ?3",
        )
        .bind(avg)
        .bind(ticker)
        .bind(day)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Newest-first headlines for the report.
    pub async fn latest_news(&self, ticker: &str, limit: i64) -> Result<Vec<NewsItem>, DigestError> {
        let rows = sqlx::query(
            "SELECT ticker, title, link, published_at, sentiment FROM news
             WHERE ticker = ?1
             ORDER BY published_at DESC
             LIMIT ?2",
        )
        .bind(ticker)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(NewsItem {
                    ticker: row.try_get("ticker").map_err(db_err)?,
                    title: row.try_get("title").map_err(db_err)?,
                    link: row.try_get("link").map_err(db_err)?,
                    published_at: row.try_get("published_at").map_err(db_err)?,
                    sentiment: row.try_get("sentiment").map_err(db_err)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use digest_core::Recommendation;

    fn sample_record(ticker: &str) -> ScoreRecord {
        ScoreRecord {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            rsi_score: 0,
            macd_score: 1,
            ma_score: 2,
            tech_score: 0.5,
            total_score: 1.25,
            rsi_label: Recommendation::Neutral,
            macd_label: Recommendation::Buy,
            ma_label: Recommendation::StrongBuy,
            tech_label: Recommendation::Buy,
            total_label: Recommendation::Buy,
            price: 187.23,
        }
    }

    fn sample_news(ticker: &str, link: &str, day: u32) -> NewsItem {
        NewsItem {
            ticker: ticker.to_string(),
            title: format!("{} headline", ticker),
            link: link.to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
            sentiment: None,
        }
    }

    #[tokio::test]
    async fn test_insert_analysis_is_idempotent_per_day() {
        let store = AnalysisStore::new("sqlite::memory:").await.unwrap();
        let record = sample_record("AAPL");
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap();

        assert!(store.insert_analysis(&record, now).await.unwrap());
        // A second run later the same day must not add a row
        let later = Utc.with_ymd_and_hms(2024, 3, 10, 21, 0, 0).unwrap();
        assert!(!store.insert_analysis(&record, later).await.unwrap());

        let rows = store
            .analyses_for_day(now.date_naive())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ticker, "AAPL");
        assert_eq!(rows[0].total_summary, "buy");
        assert!((rows[0].price - 187.23).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_same_ticker_next_day_inserts() {
        let store = AnalysisStore::new("sqlite::memory:").await.unwrap();
        let record = sample_record("MSFT");
        let day1 = Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 3, 11, 14, 0, 0).unwrap();

        assert!(store.insert_analysis(&record, day1).await.unwrap());
        assert!(store.insert_analysis(&record, day2).await.unwrap());
    }

    #[tokio::test]
    async fn test_news_link_dedup() {
        let store = AnalysisStore::new("sqlite::memory:").await.unwrap();
        let items = vec![
            sample_news("AAPL", "https://example.com/a", 9),
            sample_news("AAPL", "https://example.com/a", 9),
            sample_news("AAPL", "https://example.com/b", 9),
        ];
        assert_eq!(store.insert_news(&items).await.unwrap(), 2);
        // Re-running the same batch inserts nothing new
        assert_eq!(store.insert_news(&items).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sentiment_pass_and_window() {
        let store = AnalysisStore::new("sqlite::memory:").await.unwrap();
        store
            .insert_news(&[
                sample_news("AAPL", "https://example.com/a", 8),
                sample_news("AAPL", "https://example.com/b", 1), // outside the window
            ])
            .await
            .unwrap();

        let unscored = store.unscored_news().await.unwrap();
        assert_eq!(unscored.len(), 2);
        for (id, _) in &unscored {
            store.set_news_sentiment(*id, 0.25).await.unwrap();
        }
        assert!(store.unscored_news().await.unwrap().is_empty());

        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let values = store.window_sentiments("AAPL", day, 5).await.unwrap();
        assert_eq!(values.len(), 1);
        assert!((values[0] - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_set_sentiment_avg_lands_on_row() {
        let store = AnalysisStore::new("sqlite::memory:").await.unwrap();
        let record = sample_record("AAPL");
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap();
        store.insert_analysis(&record, now).await.unwrap();

        store
            .set_sentiment_avg("AAPL", now.date_naive(), 0.125)
            .await
            .unwrap();

        let rows = store.analyses_for_day(now.date_naive()).await.unwrap();
        assert_eq!(rows[0].sentiment_avg, Some(0.125));
    }

    #[tokio::test]
    async fn test_latest_news_ordering_and_limit() {
        let store = AnalysisStore::new("sqlite::memory:").await.unwrap();
        let items: Vec<NewsItem> = (1..=7)
            .map(|d| sample_news("AAPL", &format!("https://example.com/{}", d), d))
            .collect();
        store.insert_news(&items).await.unwrap();

        let latest = store.latest_news("AAPL", 5).await.unwrap();
        assert_eq!(latest.len(), 5);
        for pair in latest.windows(2) {
            assert!(pair[0].published_at >= pair[1].published_at);
        }
    }
}
