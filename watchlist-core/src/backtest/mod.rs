//! Long-only single-unit backtester.
//!
//! Replays a composite signal bar by bar through a two-state machine:
//!
//! | state | action | next  | cash          |
//! |-------|--------|-------|---------------|
//! | Flat  | Buy    | Long  | cash - close  |
//! | Long  | Sell   | Flat  | cash + close  |
//! | any   | other  | same  | unchanged     |
//!
//! Total = cash + (1 if Long) * close. The machine never shorts and never adds
//! to an open position.

pub mod metrics;

pub use metrics::{bar_returns, max_drawdown, sharpe_ratio, total_return, TradeStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::signals::{Action, SignalFrame};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
        }
    }
}

/// Position state of the backtest machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

/// A closed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    /// Total portfolio value per bar.
    pub equity_curve: Vec<f64>,
    /// Percent change of total per bar; the first entry is 0.
    pub returns: Vec<f64>,
    /// Position held at the close of each bar.
    pub positions: Vec<Position>,
    pub trades: Vec<Trade>,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub total_return: f64,
    pub final_position: Position,
}

impl BacktestResult {
    /// Result for a series too short to replay.
    pub fn empty(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            equity_curve: Vec::new(),
            returns: Vec::new(),
            positions: Vec::new(),
            trades: Vec::new(),
            sharpe: 0.0,
            max_drawdown: 0.0,
            total_return: 0.0,
            final_position: Position::Flat,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equity_curve.is_empty()
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().copied()
    }

    pub fn trade_stats(&self) -> TradeStats {
        TradeStats::from_trades(&self.trades)
    }
}

/// Replay `signals` over `series`.
///
/// Fewer than two bars yields [`BacktestResult::empty`]. Bars with a NaN close
/// cannot trade and are valued at the last defined close.
pub fn run_backtest(
    series: &PriceSeries,
    signals: &SignalFrame,
    config: &BacktestConfig,
) -> BacktestResult {
    let n = series.len().min(signals.len());
    if n < 2 {
        return BacktestResult::empty(config.initial_capital);
    }

    let bars = &series.bars()[..n];
    let mut cash = config.initial_capital;
    let mut position = Position::Flat;
    let mut entry: Option<(usize, f64)> = None;
    let mut last_price: Option<f64> = None;

    let mut equity_curve = Vec::with_capacity(n);
    let mut positions = Vec::with_capacity(n);
    let mut trades = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        if !bar.close.is_nan() {
            let price = bar.close;
            match (position, signals.action_at(i)) {
                (Position::Flat, Action::Buy) => {
                    cash -= price;
                    position = Position::Long;
                    entry = Some((i, price));
                }
                (Position::Long, Action::Sell) => {
                    cash += price;
                    position = Position::Flat;
                    if let Some((entry_index, entry_price)) = entry.take() {
                        trades.push(Trade {
                            entry_index,
                            entry_time: bars[entry_index].timestamp,
                            entry_price,
                            exit_index: i,
                            exit_time: bar.timestamp,
                            exit_price: price,
                            pnl: price - entry_price,
                        });
                    }
                }
                _ => {}
            }
            last_price = Some(price);
        }

        let holdings = match (position, last_price) {
            (Position::Long, Some(price)) => price,
            _ => 0.0,
        };
        equity_curve.push(cash + holdings);
        positions.push(position);
    }

    let returns = bar_returns(&equity_curve);
    BacktestResult {
        initial_capital: config.initial_capital,
        sharpe: sharpe_ratio(&returns),
        max_drawdown: max_drawdown(&equity_curve),
        total_return: total_return(&equity_curve),
        returns,
        equity_curve,
        positions,
        trades,
        final_position: position,
    }
}
