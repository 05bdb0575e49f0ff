//! Indicator engine.
//!
//! Every indicator is a pure function: close history in, numeric series out,
//! index-aligned with the input. Warm-up values are `f64::NAN`. Windows are
//! trailing, so the value at bar t never depends on bar t+1 or later.
//!
//! Each indicator is an `*_of_series` function over a slice of closes. MACD and
//! Bollinger return all of their lines at once. [`IndicatorFrame`] bundles the
//! full set for one series.

pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger_of_series, BollingerBands};
pub use ema::ema_of_series;
pub use frame::{IndicatorConfig, IndicatorFrame};
pub use macd::{macd_of_series, MacdLines};
pub use rsi::rsi_of_series;
pub use sma::sma_of_series;

#[cfg(test)]
use crate::domain::PriceBar;

/// Read a series value, treating NaN and out-of-range as absent.
pub fn defined_at(series: &[f64], index: usize) -> Option<f64> {
    series.get(index).copied().filter(|v| !v.is_nan())
}

/// Build a series from close prices for testing.
///
/// One bar per day from 2024-01-02. open = previous close, high/low = +/- 1.0
/// around the open/close envelope, volume = 1000.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> crate::domain::PriceSeries {
    crate::domain::PriceSeries::new("TEST", make_bars(closes)).unwrap()
}

#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_at_filters_nan_and_bounds() {
        let series = [f64::NAN, 1.5];
        assert_eq!(defined_at(&series, 0), None);
        assert_eq!(defined_at(&series, 1), Some(1.5));
        assert_eq!(defined_at(&series, 2), None);
    }
}
