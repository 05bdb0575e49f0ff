//! Moving Average Convergence Divergence (MACD).
//!
//! MACD = EMA(fast) - EMA(slow); Signal = EMA(signal) of MACD; Histogram = MACD - Signal.
//! The signal line seeds on the first `signal` defined MACD values, so with the
//! default 12/26/9 the first histogram value lands on bar 33.

use super::ema::ema_of_series;

/// EMAs and MACD lines, index-aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd_of_series(values: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let ema_fast = ema_of_series(values, fast);
    let ema_slow = ema_of_series(values, slow);
    let macd: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&macd, signal);
    let histogram = macd
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdLines {
        ema_fast,
        ema_slow,
        macd,
        signal_line,
        histogram,
    }
}
