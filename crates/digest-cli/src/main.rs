//! digest: the daily batch. Fetches prices and news per ticker, scores the
//! technical indicators into recommendations, stores one row per
//! (ticker, day), blends news sentiment, then assembles and delivers the
//! daily report.
//!
//! Usage:
//!   cargo run -p digest-cli -- --tickers AAPL MSFT BTC-USD
//!   cargo run -p digest-cli --                  # full default universe
//!   cargo run -p digest-cli -- --report-only    # skip fetching, just report
//!   cargo run -p digest-cli -- --no-email

use analysis_store::AnalysisStore;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use daily_report::{
    build_report_text, narrate_or_fallback, render_to_file, NarratorClient, REPORT_NEWS_LIMIT,
};
use digest_core::{DigestConfig, DigestError, Narrator};
use market_data::YahooClient;
use news_sentiment::{mean_or_zero, HeadlineScorer};
use notifier::DigestMailer;
use std::collections::HashMap;
use std::time::Duration;
use technical_scoring::score_series;

const DEFAULT_TICKERS: &[&str] = &[
    // US large caps
    "AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA", "BRK-B", "JNJ", "V", "WMT", "BABA", "NVDA",
    "GOLD", "MELI", "NFLX", "PYPL", "GM", "AAL", "ABNB",
    // Argentina
    "GGAL.BA", "YPFD.BA", "PAMP.BA", "TX", "CEPU.BA", "SUPV.BA", "ALUA.BA", "BMA.BA", "EDN.BA",
    "COME.BA", "LOMA.BA", "MIRG.BA", "TRAN.BA",
    // Crypto
    "BTC-USD", "ETH-USD", "BNB-USD", "XRP-USD", "ADA-USD", "SOL-USD", "DOT-USD", "DOGE-USD",
    "LTC-USD", "MATIC-USD",
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "digest=info,market_data=warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let report_only = args.iter().any(|a| a == "--report-only");
    let no_email = args.iter().any(|a| a == "--no-email");

    let tickers: Vec<String> = if let Some(idx) = args.iter().position(|a| a == "--tickers") {
        args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .cloned()
            .collect()
    } else {
        DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect()
    };

    let mut config = DigestConfig::from_env()?;
    if let Some(idx) = args.iter().position(|a| a == "--db") {
        if let Some(url) = args.get(idx + 1) {
            config.database_url = url.clone();
        }
    }

    let store = AnalysisStore::new(&config.database_url).await?;
    let client = YahooClient::new(config.market_data_base_url.clone());

    let today = Utc::now().date_naive();

    if !report_only {
        tracing::info!("Processing {} tickers", tickers.len());
        for ticker in &tickers {
            // Failure isolation lives at ticker granularity: one bad ticker
            // never stops the batch.
            if let Err(e) = process_ticker(&client, &store, ticker).await {
                tracing::warn!("Skipping analysis for {}: {}", ticker, e);
            }
            if let Err(e) = collect_news(&client, &store, ticker).await {
                tracing::warn!("News collection failed for {}: {}", ticker, e);
            }
        }

        if let Err(e) = score_pending_news(&store).await {
            tracing::error!("Sentiment pass failed: {}", e);
        }
        if let Err(e) = blend_sentiment(&store, &tickers, today, config.sentiment_window_days).await
        {
            tracing::error!("Sentiment blend failed: {}", e);
        }
    }

    generate_report(&store, &config, today, no_email).await?;

    Ok(())
}

/// Fetch one year of daily bars, score them and store today's record.
async fn process_ticker(
    client: &YahooClient,
    store: &AnalysisStore,
    ticker: &str,
) -> Result<(), DigestError> {
    let bars = client.daily_series(ticker).await?;
    if bars.is_empty() {
        return Err(DigestError::InvalidData(format!(
            "{}: no price data returned",
            ticker
        )));
    }

    let record = score_series(ticker, &bars)?;
    tracing::info!(
        "{}: total {} (technical {}, moving averages {}), RSI {}, MACD {}, price {:.2}",
        ticker,
        record.total_label,
        record.tech_label,
        record.ma_label,
        record.rsi_label,
        record.macd_label,
        record.price
    );

    store.insert_analysis(&record, Utc::now()).await?;
    Ok(())
}

async fn collect_news(
    client: &YahooClient,
    store: &AnalysisStore,
    ticker: &str,
) -> Result<(), DigestError> {
    let items = client.latest_headlines(ticker).await?;
    if items.is_empty() {
        tracing::info!("No news found for {}", ticker);
        return Ok(());
    }

    let inserted = store.insert_news(&items).await?;
    tracing::info!("{}: stored {} of {} headlines", ticker, inserted, items.len());
    Ok(())
}

/// Score every headline whose sentiment is still unset.
async fn score_pending_news(store: &AnalysisStore) -> Result<(), DigestError> {
    let scorer = HeadlineScorer::new();
    let pending = store.unscored_news().await?;
    if pending.is_empty() {
        return Ok(());
    }

    for (id, title) in &pending {
        let sentiment = scorer.score(title);
        store.set_news_sentiment(*id, sentiment).await?;
    }
    tracing::info!("Scored sentiment for {} headlines", pending.len());
    Ok(())
}

/// Attach the trailing sentiment window to each ticker's row for the day.
async fn blend_sentiment(
    store: &AnalysisStore,
    tickers: &[String],
    day: NaiveDate,
    n_days: i64,
) -> Result<(), DigestError> {
    for ticker in tickers {
        let values = store.window_sentiments(ticker, day, n_days).await?;
        let avg = mean_or_zero(&values);
        store.set_sentiment_avg(ticker, day, avg).await?;
    }
    Ok(())
}

async fn generate_report(
    store: &AnalysisStore,
    config: &DigestConfig,
    day: NaiveDate,
    no_email: bool,
) -> Result<()> {
    let rows = store.analyses_for_day(day).await?;
    if rows.is_empty() {
        tracing::info!("No analysis rows for {}, nothing to report", day);
        return Ok(());
    }

    let mut news_by_ticker = HashMap::new();
    for row in &rows {
        let news = store
            .latest_news(&row.ticker, REPORT_NEWS_LIMIT as i64)
            .await
            .unwrap_or_default();
        news_by_ticker.insert(row.ticker.clone(), news);
    }

    let base_report = build_report_text(day, &rows, &news_by_ticker);

    let narrator = config
        .narrator
        .as_ref()
        .map(|cfg| NarratorClient::new(cfg, Duration::from_secs(60)));
    let final_report =
        narrate_or_fallback(narrator.as_ref().map(|n| n as &dyn Narrator), &base_report).await;

    let path = render_to_file(day, &final_report, std::path::Path::new("."))?;
    tracing::info!("Report written to {}", path.display());

    if no_email {
        return Ok(());
    }
    if let Some(smtp) = &config.smtp {
        let subject = format!("Daily Market Report: {}", day.format("%Y-%m-%d"));
        match DigestMailer::new(smtp) {
            Ok(mailer) => {
                if let Err(e) = mailer.send_digest(&subject, &final_report).await {
                    tracing::error!("Email delivery failed: {}", e);
                }
            }
            Err(e) => tracing::error!("Mailer configuration invalid: {}", e),
        }
    }

    Ok(())
}
