//! Per-ticker pipeline.
//!
//! fetch (cached) -> indicators -> levels -> signals -> backtest -> trade
//! stats / Kelly -> position plan -> headline (cached) -> sentiment (cached)
//! -> fusion.
//!
//! Every failure is local to its ticker and to its stage: a failed price fetch
//! still lets the headline be shown, and a failed sentiment call still leaves
//! a technical-only decision.

use chrono::{NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use watchlist_core::backtest::{run_backtest, BacktestResult, TradeStats};
use watchlist_core::domain::PriceSeries;
use watchlist_core::indicators::IndicatorFrame;
use watchlist_core::levels::{detect_levels, PriceLevels};
use watchlist_core::risk::{kelly_fraction, position_size};
use watchlist_core::signals::{Action, SignalFrame};

use crate::cache::{headline_digest, TtlCache};
use crate::config::{RiskConfig, WatchlistConfig};
use crate::fusion::{fuse, FusedSignal};
use crate::provider::{
    DateRange, HeadlineProvider, PriceProvider, PriceRequest, ProviderError, SentimentScore,
    SentimentScorer,
};

/// Where the stop of a position plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopSource {
    /// Nearest detected support below the entry.
    Support,
    /// `entry * (1 - default_stop_pct)`.
    DefaultPercent,
}

/// Suggested size for a long entry at the last close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionPlan {
    pub entry: f64,
    pub stop: f64,
    pub stop_source: StopSource,
    pub shares: f64,
    /// Dollars lost if the stop is hit.
    pub risk_amount: f64,
}

impl PositionPlan {
    pub fn new(entry: f64, levels: &PriceLevels, risk: &RiskConfig) -> Self {
        let (stop, stop_source) = match levels.nearest_support_below(entry) {
            Some(support) => (support, StopSource::Support),
            None => (entry * (1.0 - risk.default_stop_pct), StopSource::DefaultPercent),
        };
        let shares = position_size(risk.account_size, risk.risk_pct, entry, stop);
        Self {
            entry,
            stop,
            stop_source,
            shares,
            risk_amount: shares * (entry - stop).abs(),
        }
    }
}

/// Everything derived from one ticker's price series.
#[derive(Debug, Clone)]
pub struct TechnicalAnalysis {
    pub series: PriceSeries,
    pub indicators: IndicatorFrame,
    pub levels: PriceLevels,
    pub signals: SignalFrame,
    pub backtest: BacktestResult,
    pub trade_stats: TradeStats,
    pub kelly: f64,
    pub plan: Option<PositionPlan>,
}

impl TechnicalAnalysis {
    /// Composite at the last bar.
    pub fn composite(&self) -> Option<f64> {
        self.signals.last_composite()
    }

    /// Action at the last bar.
    pub fn action(&self) -> Action {
        self.signals
            .len()
            .checked_sub(1)
            .map_or(Action::Hold, |i| self.signals.action_at(i))
    }

    pub fn last_close(&self) -> Option<f64> {
        last_defined_close(&self.series)
    }
}

#[derive(Debug, Clone)]
pub enum Analysis {
    /// The provider answered but had no bars.
    NoData,
    Ready(Box<TechnicalAnalysis>),
    Failed(ProviderError),
}

impl Analysis {
    pub fn technical(&self) -> Option<&TechnicalAnalysis> {
        match self {
            Analysis::Ready(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeadlineOutcome {
    Found(String),
    NoHeadline,
    Failed(ProviderError),
}

impl HeadlineOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            HeadlineOutcome::Found(h) => Some(h),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SentimentOutcome {
    Scored(SentimentScore),
    /// No headline, or no scorer configured.
    NotScored,
    Failed(ProviderError),
}

impl SentimentOutcome {
    pub fn score(&self) -> Option<&SentimentScore> {
        match self {
            SentimentOutcome::Scored(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickerReport {
    pub ticker: String,
    pub analysis: Analysis,
    pub headline: HeadlineOutcome,
    pub sentiment: SentimentOutcome,
    pub fused: FusedSignal,
}

/// Run the pure technical stages over an already-fetched series.
///
/// An empty series is [`Analysis::NoData`].
pub fn analyze_series(series: PriceSeries, config: &WatchlistConfig) -> Analysis {
    if series.is_empty() {
        return Analysis::NoData;
    }

    let indicators = IndicatorFrame::compute_with(
        &series,
        &config.indicators,
        &config.signals.required_sma_windows(),
    );
    let levels = detect_levels(&series, &config.levels);
    let signals = SignalFrame::generate(&series, &indicators, &config.signals);
    let backtest = run_backtest(&series, &signals, &config.backtest);
    let trade_stats = backtest.trade_stats();
    let kelly = kelly_fraction(trade_stats.win_rate, trade_stats.win_loss_ratio);
    let plan = last_defined_close(&series).map(|entry| PositionPlan::new(entry, &levels, &config.risk));

    Analysis::Ready(Box::new(TechnicalAnalysis {
        series,
        indicators,
        levels,
        signals,
        backtest,
        trade_stats,
        kelly,
        plan,
    }))
}

fn last_defined_close(series: &PriceSeries) -> Option<f64> {
    series
        .bars()
        .iter()
        .rev()
        .map(|b| b.close)
        .find(|c| c.is_finite() && *c > 0.0)
}

/// Runs the pipeline for a watchlist, sharing caches across tickers and calls.
pub struct Analyzer {
    config: WatchlistConfig,
    prices: Box<dyn PriceProvider>,
    headlines: Box<dyn HeadlineProvider>,
    scorer: Option<Box<dyn SentimentScorer>>,
    price_cache: TtlCache<PriceRequest, PriceSeries>,
    headline_cache: TtlCache<(String, NaiveDate), String>,
    sentiment_cache: TtlCache<[u8; 32], SentimentScore>,
    as_of: Option<NaiveDate>,
}

impl Analyzer {
    pub fn new(
        config: WatchlistConfig,
        prices: Box<dyn PriceProvider>,
        headlines: Box<dyn HeadlineProvider>,
        scorer: Option<Box<dyn SentimentScorer>>,
    ) -> Self {
        let price_cache = TtlCache::new("prices", config.cache.price_ttl());
        let headline_cache = TtlCache::new("headlines", config.cache.news_ttl());
        let sentiment_cache = TtlCache::new("sentiment", config.cache.news_ttl());
        Self {
            config,
            prices,
            headlines,
            scorer,
            price_cache,
            headline_cache,
            sentiment_cache,
            as_of: None,
        }
    }

    /// Pin "today" for headline date ranges (defaults to the current UTC date).
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn config(&self) -> &WatchlistConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Fetch bars through the price cache. Empty answers are not cached.
    pub fn fetch_series(&self, ticker: &str) -> Result<Option<PriceSeries>, ProviderError> {
        let request = PriceRequest::new(ticker, &self.config.period, &self.config.interval);
        if let Some(series) = self.price_cache.get(&request) {
            return Ok(Some(series));
        }
        let fetched = self.prices.fetch(&request)?;
        match fetched {
            Some(series) if !series.is_empty() => {
                self.price_cache.insert(request, series.clone());
                Ok(Some(series))
            }
            _ => Ok(None),
        }
    }

    fn fetch_headline(&self, ticker: &str) -> HeadlineOutcome {
        let today = self.today();
        let key = (ticker.to_string(), today);
        if let Some(headline) = self.headline_cache.get(&key) {
            return HeadlineOutcome::Found(headline);
        }

        let range = DateRange::ending_on(today, self.config.provider.news_lookback_days);
        match self.headlines.headline(ticker, &range) {
            Ok(Some(headline)) => {
                self.headline_cache.insert(key, headline.clone());
                HeadlineOutcome::Found(headline)
            }
            Ok(None) => HeadlineOutcome::NoHeadline,
            Err(e) => {
                warn!(ticker, provider = self.headlines.name(), error = %e, "headline fetch failed");
                HeadlineOutcome::Failed(e)
            }
        }
    }

    fn score_headline(&self, ticker: &str, headline: &HeadlineOutcome) -> SentimentOutcome {
        let (Some(scorer), Some(text)) = (self.scorer.as_deref(), headline.text()) else {
            return SentimentOutcome::NotScored;
        };
        match self
            .sentiment_cache
            .get_or_try_insert_with(headline_digest(text), || scorer.score(text))
        {
            Ok(score) => SentimentOutcome::Scored(score),
            Err(e) => {
                warn!(ticker, scorer = scorer.name(), error = %e, "sentiment scoring failed");
                SentimentOutcome::Failed(e)
            }
        }
    }

    /// Run the full pipeline for one ticker.
    pub fn analyze(&self, ticker: &str) -> TickerReport {
        let analysis = match self.fetch_series(ticker) {
            Ok(Some(series)) => analyze_series(series, &self.config),
            Ok(None) => {
                warn!(ticker, provider = self.prices.name(), "no price data");
                Analysis::NoData
            }
            Err(e) => {
                warn!(ticker, provider = self.prices.name(), error = %e, "price fetch failed");
                Analysis::Failed(e)
            }
        };

        let headline = self.fetch_headline(ticker);
        let sentiment = self.score_headline(ticker, &headline);

        let technical = analysis.technical().and_then(TechnicalAnalysis::composite);
        let fused = fuse(technical, sentiment.score(), &self.config.fusion);

        if let Some(t) = analysis.technical() {
            info!(
                ticker,
                bars = t.series.len(),
                composite = technical.unwrap_or(0.0),
                sharpe = t.backtest.sharpe,
                decision = fused.decision.label(),
                "analyzed"
            );
        }

        TickerReport {
            ticker: ticker.to_string(),
            analysis,
            headline,
            sentiment,
            fused,
        }
    }

    /// Analyze every ticker in parallel. Reports come back in input order.
    pub fn analyze_all(&self, tickers: &[String]) -> Vec<TickerReport> {
        tickers.par_iter().map(|t| self.analyze(t)).collect()
    }
}
