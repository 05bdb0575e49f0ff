//! Collaborator traits and structured error types.
//!
//! Price data, news headlines, and sentiment scores all come from outside the
//! process. Each source sits behind a trait so the pipeline can swap the live
//! implementation for an offline or stub one. Caching sits above these traits;
//! providers never cache and never retry.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use watchlist_core::domain::{PriceSeries, SeriesError};

/// Structured error types for external calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} from {provider}")]
    Http { provider: String, status: u16 },

    #[error("unsupported request: {0}")]
    UnsupportedRequest(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("environment variable {var} is not set")]
    MissingApiKey { var: String },

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

impl ProviderError {
    /// Map a transport error from the HTTP client.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        ProviderError::NetworkUnreachable(err.to_string())
    }
}

/// True for symbols made of ASCII letters, digits and `.-_^=` that do not
/// start with a dot (`BRK-B`, `^GSPC`, `EURUSD=X`). Such a symbol is safe to
/// use as a file name stem.
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && !ticker.starts_with('.')
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '^' | '='))
}

/// What to fetch: a ticker, a lookback period (e.g. "1d", "5d", "1mo") and a
/// bar interval (e.g. "5m", "1d").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRequest {
    pub ticker: String,
    pub period: String,
    pub interval: String,
}

impl PriceRequest {
    pub fn new(
        ticker: impl Into<String>,
        period: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            period: period.into(),
            interval: interval.into(),
        }
    }
}

/// Inclusive calendar-date range in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `days` calendar days ending on `end` (inclusive).
    pub fn ending_on(end: NaiveDate, days: u32) -> Self {
        let span = Duration::days(i64::from(days.saturating_sub(1)));
        Self {
            start: end - span,
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        self.start <= date && date <= self.end
    }
}

/// A headline rating from a language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// 1 (very bearish) to 10 (very bullish).
    pub score: f64,
    pub reasoning: String,
}

impl SentimentScore {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 10.0;

    /// Map the 1..=10 score onto [-1, 1]; 5.5 is neutral.
    pub fn normalized(&self) -> f64 {
        let mid = (Self::MIN + Self::MAX) / 2.0;
        let half_span = (Self::MAX - Self::MIN) / 2.0;
        ((self.score - mid) / half_span).clamp(-1.0, 1.0)
    }
}

/// Source of recent price bars.
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch bars for `request`. `Ok(None)` means the source answered but had
    /// no bars for that ticker and window.
    fn fetch(&self, request: &PriceRequest) -> Result<Option<PriceSeries>, ProviderError>;
}

/// Source of news headlines.
pub trait HeadlineProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Most recent headline about `ticker` published inside `range`.
    fn headline(&self, ticker: &str, range: &DateRange) -> Result<Option<String>, ProviderError>;
}

/// Rates a headline on a 1..=10 bearish-to-bullish scale.
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, headline: &str) -> Result<SentimentScore, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_range_ending_on_is_inclusive() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let range = DateRange::ending_on(end, 7);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()));
    }

    #[test]
    fn single_day_range() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(DateRange::ending_on(day, 1), DateRange::new(day, day));
        assert_eq!(DateRange::ending_on(day, 0), DateRange::new(day, day));
    }

    #[test]
    fn sentiment_normalization() {
        let at = |score| SentimentScore {
            score,
            reasoning: String::new(),
        };
        assert_eq!(at(1.0).normalized(), -1.0);
        assert_eq!(at(10.0).normalized(), 1.0);
        assert_eq!(at(5.5).normalized(), 0.0);
        assert!((at(8.0).normalized() - 2.5 / 4.5).abs() < 1e-12);
    }

    #[test]
    fn ticker_symbols() {
        for ok in ["IONQ", "BRK-B", "BRK.B", "^GSPC", "EURUSD=X", "RDS_A"] {
            assert!(is_valid_ticker(ok), "rejected {ok:?}");
        }
        for bad in ["", "..", ".hidden", "a/b", "..\\x", "IONQ ", "Q\0"] {
            assert!(!is_valid_ticker(bad), "accepted {bad:?}");
        }
    }

    #[test]
    fn series_error_converts() {
        let err: ProviderError = SeriesError::NonIncreasingTimestamp { index: 3 }.into();
        assert!(matches!(err, ProviderError::InvalidSeries(_)));
        assert!(err.to_string().contains("bar 3"));
    }
}
