use chrono::{Duration, NaiveDate};
use digest_core::NewsItem;

/// Average a set of sentiment values; an empty set is a defined 0.0, never
/// NaN or null downstream.
pub fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Trailing sentiment window for one (ticker, date): the mean sentiment of
/// the ticker's news published in `[date - n_days, date]`, both ends
/// inclusive. Items not yet scored are left out of the mean. Days without
/// any matching news get 0.0; there is no carry-forward from earlier days.
pub fn window_average(items: &[NewsItem], ticker: &str, date: NaiveDate, n_days: i64) -> f64 {
    let from = date - Duration::days(n_days);
    let values: Vec<f64> = items
        .iter()
        .filter(|item| item.ticker == ticker)
        .filter(|item| {
            let published = item.published_at.date_naive();
            published >= from && published <= date
        })
        .filter_map(|item| item.sentiment)
        .collect();
    mean_or_zero(&values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(ticker: &str, day: u32, sentiment: Option<f64>) -> NewsItem {
        NewsItem {
            ticker: ticker.to_string(),
            title: format!("{} headline {}", ticker, day),
            link: format!("https://example.com/{}/{}", ticker, day),
            published_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            sentiment,
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_empty_window_is_exactly_zero() {
        let avg = window_average(&[], "AAPL", march(10), 5);
        assert_eq!(avg, 0.0);
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let items = vec![
            item("AAPL", 5, Some(0.4)),  // date - 5, inside
            item("AAPL", 10, Some(0.8)), // the date itself, inside
            item("AAPL", 4, Some(-1.0)), // one day too old
            item("AAPL", 11, Some(-1.0)), // published after the date
        ];
        let avg = window_average(&items, "AAPL", march(10), 5);
        assert!((avg - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_other_tickers_excluded() {
        let items = vec![item("AAPL", 9, Some(0.5)), item("MSFT", 9, Some(-0.5))];
        let avg = window_average(&items, "AAPL", march(10), 5);
        assert!((avg - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unscored_items_left_out() {
        let items = vec![item("AAPL", 9, Some(0.5)), item("AAPL", 8, None)];
        let avg = window_average(&items, "AAPL", march(10), 5);
        assert!((avg - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_only_unscored_items_defaults_to_zero() {
        let items = vec![item("AAPL", 9, None)];
        assert_eq!(window_average(&items, "AAPL", march(10), 5), 0.0);
    }
}
