//! Edge-triggered crossover rules: SMA golden/death cross and MACD/signal cross.
//!
//! Buy on the bar where the fast line moves above the slow line (fast > slow now,
//! fast <= slow one bar earlier). Sell on the symmetric bar. Hold everywhere
//! else, including while the ordering merely persists.

use super::{Signal, SignalRule};
use crate::domain::PriceSeries;
use crate::indicators::IndicatorFrame;

/// Classify a crossover from current and previous values of two lines.
pub fn crossover(fast_cur: f64, slow_cur: f64, fast_prev: f64, slow_prev: f64) -> Signal {
    if fast_cur > slow_cur && fast_prev <= slow_prev {
        Signal::Buy
    } else if fast_cur < slow_cur && fast_prev >= slow_prev {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Moving average crossover on two SMA windows (default 50/200).
#[derive(Debug, Clone)]
pub struct SmaCross {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl SmaCross {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(
            slow_period > fast_period,
            "slow_period must be > fast_period"
        );
        Self {
            fast_period,
            slow_period,
        }
    }
}

impl Default for SmaCross {
    fn default() -> Self {
        Self::new(50, 200)
    }
}

impl SignalRule for SmaCross {
    fn name(&self) -> &str {
        "sma_cross"
    }

    fn evaluate(&self, _series: &PriceSeries, frame: &IndicatorFrame, index: usize) -> Signal {
        if index == 0 {
            return Signal::Hold;
        }
        let values = (
            frame.sma(self.fast_period, index),
            frame.sma(self.slow_period, index),
            frame.sma(self.fast_period, index - 1),
            frame.sma(self.slow_period, index - 1),
        );
        match values {
            (Some(fc), Some(sc), Some(fp), Some(sp)) => crossover(fc, sc, fp, sp),
            _ => Signal::Hold,
        }
    }
}

/// MACD line crossing its signal line.
#[derive(Debug, Clone, Default)]
pub struct MacdCross;

impl SignalRule for MacdCross {
    fn name(&self) -> &str {
        "macd_cross"
    }

    fn evaluate(&self, _series: &PriceSeries, frame: &IndicatorFrame, index: usize) -> Signal {
        if index == 0 {
            return Signal::Hold;
        }
        let values = (
            frame.macd_at(index),
            frame.signal_line_at(index),
            frame.macd_at(index - 1),
            frame.signal_line_at(index - 1),
        );
        match values {
            (Some(mc), Some(sc), Some(mp), Some(sp)) => crossover(mc, sc, mp, sp),
            _ => Signal::Hold,
        }
    }
}
