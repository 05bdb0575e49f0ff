//! Watchlist Core: indicators, levels, signals, backtesting, and risk sizing.
//!
//! Everything in this crate is a synchronous, pure transform over an in-memory
//! `PriceSeries`:
//! - Indicator engine (SMA, EMA, RSI, MACD, Bollinger Bands)
//! - Support/resistance level detection and clustering
//! - Per-rule signals and their equal-weight composite
//! - Long-only single-unit backtester with Sharpe and drawdown
//! - Position sizing and capped Kelly fraction
//!
//! Data flows one way: series -> indicators -> signals -> backtest. Levels read
//! the raw series independently.

pub mod backtest;
pub mod domain;
pub mod indicators;
pub mod levels;
pub mod risk;
pub mod signals;

pub use backtest::{run_backtest, BacktestConfig, BacktestResult, Position, Trade, TradeStats};
pub use domain::{PriceBar, PriceSeries, SeriesError};
pub use indicators::{IndicatorConfig, IndicatorFrame};
pub use levels::{cluster_levels, detect_levels, LevelConfig, PriceLevels};
pub use risk::{kelly_fraction, position_size, KELLY_CAP};
pub use signals::{Action, Signal, SignalConfig, SignalFrame};
