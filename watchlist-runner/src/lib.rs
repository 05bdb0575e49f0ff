//! Watchlist Runner: external collaborators, caching, fusion, and reporting.
//!
//! This crate builds on `watchlist-core` to provide:
//! - TOML configuration with validation
//! - Price providers (Yahoo chart API, offline synthetic walk)
//! - Headline providers (Yahoo search API, offline template)
//! - Language-model sentiment scoring with strict reply parsing
//! - TTL caches that memoize successes only
//! - Technical + sentiment fusion into a Buy/Hold/Sell decision
//! - Parallel per-ticker pipeline, CSV export, and a text report

pub mod cache;
pub mod config;
pub mod export;
pub mod fusion;
pub mod headline;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod sentiment;
pub mod synthetic;
pub mod yahoo;

pub use cache::{CacheStats, TtlCache};
pub use config::{ConfigError, WatchlistConfig};
pub use export::{export_frame_csv, export_summary_csv, write_reports, ExportError};
pub use fusion::{fuse, Decision, FusedSignal, FusionConfig};
pub use headline::TemplateHeadlineProvider;
pub use pipeline::{
    analyze_series, Analysis, Analyzer, HeadlineOutcome, PositionPlan, SentimentOutcome,
    StopSource, TechnicalAnalysis, TickerReport,
};
pub use provider::{
    is_valid_ticker, DateRange, HeadlineProvider, PriceProvider, PriceRequest, ProviderError,
    SentimentScore, SentimentScorer,
};
pub use report::{render_report, render_ticker};
pub use sentiment::{parse_sentiment_reply, ChatSentimentScorer};
pub use synthetic::SyntheticProvider;
pub use yahoo::{YahooChartProvider, YahooNewsProvider};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn analyzer_is_send_sync() {
        assert_send::<Analyzer>();
        assert_sync::<Analyzer>();
    }

    #[test]
    fn reports_are_send() {
        assert_send::<TickerReport>();
        assert_send::<ProviderError>();
    }
}
