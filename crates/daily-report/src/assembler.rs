use chrono::NaiveDate;
use digest_core::{AnalysisRow, NewsItem};
use std::collections::HashMap;

/// How many headlines each ticker contributes to the report.
pub const REPORT_NEWS_LIMIT: usize = 5;

/// Assemble the plain-text base report from the day's analysis rows and
/// their latest headlines.
pub fn build_report_text(
    day: NaiveDate,
    rows: &[AnalysisRow],
    news_by_ticker: &HashMap<String, Vec<NewsItem>>,
) -> String {
    let mut report = String::new();
    report.push_str("Daily Market Report\n");
    report.push_str(&format!("Date: {}\n\n", day.format("%Y-%m-%d")));
    report.push_str("Analysis Summary:\n");

    for row in rows {
        report.push_str(&format!("- {}:\n", row.ticker));
        report.push_str(&format!(
            "   Overall recommendation: {} (technical: {}, moving averages: {}).\n",
            row.total_summary, row.technical_indicators_summary, row.moving_averages_summary
        ));
        report.push_str(&format!(
            "   RSI: {}, MACD: {}. Price: {}\n",
            row.rsi_action, row.macd_action, row.price
        ));
        if let Some(avg) = row.sentiment_avg {
            report.push_str(&format!("   News sentiment average: {:.2}\n", avg));
        }

        match news_by_ticker.get(&row.ticker) {
            Some(news) if !news.is_empty() => {
                report.push_str("   Latest news:\n");
                for item in news.iter().take(REPORT_NEWS_LIMIT) {
                    report.push_str(&format!(
                        "      * {} - {} (published {})\n",
                        item.title,
                        item.link,
                        item.published_at.format("%Y-%m-%d")
                    ));
                }
            }
            _ => report.push_str("   No recent news found.\n"),
        }
        report.push('\n');
    }

    report
}

/// Wrap the base report in the analyst prompt sent to the narrator.
pub fn narrative_prompt(base_report: &str) -> String {
    format!(
        "You are an experienced financial analyst. Based on the following daily data, \
         write a report that covers:\n\
         - The overall state of the market.\n\
         - Clear buy and sell recommendations for the day.\n\
         - Trend analysis and technical factors (indicators, moving averages, RSI, MACD).\n\
         Data:\n{}\n\
         The report must be concise, clear and useful for daily investment decisions.",
        base_report
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_row(ticker: &str, sentiment_avg: Option<f64>) -> AnalysisRow {
        AnalysisRow {
            ticker: ticker.to_string(),
            analysis_date: Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap(),
            total_summary: "buy".to_string(),
            technical_indicators_summary: "neutral".to_string(),
            moving_averages_summary: "strong buy".to_string(),
            rsi_action: "neutral".to_string(),
            macd_action: "buy".to_string(),
            price: 187.23,
            sentiment_avg,
        }
    }

    #[test]
    fn test_report_lists_each_ticker() {
        let rows = vec![sample_row("AAPL", Some(0.31)), sample_row("MSFT", None)];
        let mut news = HashMap::new();
        news.insert(
            "AAPL".to_string(),
            vec![NewsItem {
                ticker: "AAPL".to_string(),
                title: "Shares rally".to_string(),
                link: "https://example.com/a".to_string(),
                published_at: Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap(),
                sentiment: Some(0.31),
            }],
        );

        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let report = build_report_text(day, &rows, &news);

        assert!(report.contains("Date: 2024-03-10"));
        assert!(report.contains("- AAPL:"));
        assert!(report.contains("Overall recommendation: buy"));
        assert!(report.contains("News sentiment average: 0.31"));
        assert!(report.contains("Shares rally"));
        // MSFT has no stored news and no sentiment
        assert!(report.contains("- MSFT:"));
        assert!(report.contains("No recent news found."));
    }

    #[test]
    fn test_report_caps_headlines() {
        let rows = vec![sample_row("AAPL", None)];
        let items: Vec<NewsItem> = (0..8)
            .map(|i| NewsItem {
                ticker: "AAPL".to_string(),
                title: format!("Headline {}", i),
                link: format!("https://example.com/{}", i),
                published_at: Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap(),
                sentiment: None,
            })
            .collect();
        let mut news = HashMap::new();
        news.insert("AAPL".to_string(), items);

        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let report = build_report_text(day, &rows, &news);
        assert_eq!(report.matches("      * ").count(), REPORT_NEWS_LIMIT);
    }

    #[test]
    fn test_prompt_embeds_report() {
        let prompt = narrative_prompt("BASE REPORT BODY");
        assert!(prompt.contains("BASE REPORT BODY"));
        assert!(prompt.contains("financial analyst"));
    }
}
