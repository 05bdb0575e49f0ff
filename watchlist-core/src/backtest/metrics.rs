//! Performance metrics: pure functions over an equity curve or trade list.

use serde::{Deserialize, Serialize};

use super::Trade;

/// Trading periods per year used to annualize the Sharpe ratio.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Bar-over-bar percent change of an equity curve. The first return is 0.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.is_empty() {
        return Vec::new();
    }
    let mut returns = Vec::with_capacity(equity_curve.len());
    returns.push(0.0);
    returns.extend(equity_curve.windows(2).map(|w| {
        if w[0] != 0.0 {
            (w[1] - w[0]) / w[0]
        } else {
            0.0
        }
    }));
    returns
}

/// Annualized Sharpe ratio: mean / sample stddev * sqrt(252).
///
/// Exactly 0.0 when the returns have no variance or fewer than 2 values.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    mean_f64(returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a non-positive fraction (e.g., -0.15 = 15% below peak).
///
/// Returns 0.0 if equity never falls below its running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

/// Win/loss summary of closed trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub trade_count: usize,
    /// Fraction of trades with positive P&L.
    pub win_rate: f64,
    /// Average winning P&L over average losing |P&L|; 0.0 without both wins and losses.
    pub win_loss_ratio: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = trades
            .iter()
            .map(|t| t.pnl)
            .filter(|&p| p < 0.0)
            .map(f64::abs)
            .collect();

        let win_loss_ratio = if wins.is_empty() || losses.is_empty() {
            0.0
        } else {
            mean_f64(&wins) / mean_f64(&losses)
        };

        Self {
            trade_count: trades.len(),
            win_rate: wins.len() as f64 / trades.len() as f64,
            win_loss_ratio,
        }
    }
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    fn trade(pnl: f64) -> Trade {
        Trade {
            entry_index: 0,
            entry_time: Default::default(),
            entry_price: 100.0,
            exit_index: 1,
            exit_time: Default::default(),
            exit_price: 100.0 + pnl,
            pnl,
        }
    }

    #[test]
    fn returns_start_at_zero() {
        let r = bar_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0], 0.0);
        assert_approx(r[1], 0.1, 1e-12);
        assert_approx(r[2], -0.1, 1e-12);
        assert!(bar_returns(&[]).is_empty());
    }

    #[test]
    fn sharpe_zero_volatility_is_exactly_zero() {
        assert_eq!(sharpe_ratio(&[0.0; 10]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
        assert_eq!(sharpe_ratio(&[]), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean = 0.01, sample std = 0.01
        let r = [0.0, 0.01, 0.02];
        assert_approx(sharpe_ratio(&r), 252.0_f64.sqrt(), 1e-9);
    }

    #[test]
    fn drawdown_from_running_peak() {
        assert_approx(max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]), -0.25, 1e-12);
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn total_return_fraction() {
        assert_approx(total_return(&[100.0, 150.0]), 0.5, 1e-12);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn trade_stats() {
        let stats = TradeStats::from_trades(&[trade(10.0), trade(-5.0), trade(20.0), trade(-5.0)]);
        assert_eq!(stats.trade_count, 4);
        assert_approx(stats.win_rate, 0.5, 1e-12);
        assert_approx(stats.win_loss_ratio, 3.0, 1e-12);
    }

    #[test]
    fn trade_stats_without_losses() {
        let stats = TradeStats::from_trades(&[trade(10.0)]);
        assert_eq!(stats.win_rate, 1.0);
        assert_eq!(stats.win_loss_ratio, 0.0);
        assert_eq!(TradeStats::from_trades(&[]), TradeStats::default());
    }
}
