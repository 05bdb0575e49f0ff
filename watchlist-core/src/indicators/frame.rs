//! IndicatorFrame: every indicator for one series, computed in one pass.
//!
//! Built once per analysis, then queried by bar index. Warm-up values are NaN
//! in storage and `None` through the accessors, so "not yet defined" can never
//! be mistaken for a computed zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bollinger::bollinger_of_series;
use super::macd::macd_of_series;
use super::rsi::rsi_of_series;
use super::sma::sma_of_series;
use super::defined_at;
use crate::domain::PriceSeries;

/// Window sizes for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_windows: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_windows: vec![10, 20, 50, 200],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
        }
    }
}

/// Derived indicator series, index-aligned with the source `PriceSeries`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    len: usize,
    sma: BTreeMap<usize, Vec<f64>>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub macd_histogram: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_middle: Vec<f64>,
    pub bb_lower: Vec<f64>,
}

impl IndicatorFrame {
    /// Compute all configured indicators over the closes of `series`.
    ///
    /// `extra_sma_windows` lets callers guarantee the windows a signal rule
    /// depends on (e.g. the 50/200 cross) even if the config omits them.
    pub fn compute(series: &PriceSeries, config: &IndicatorConfig) -> Self {
        Self::compute_with(series, config, &[])
    }

    pub fn compute_with(
        series: &PriceSeries,
        config: &IndicatorConfig,
        extra_sma_windows: &[usize],
    ) -> Self {
        let closes = series.closes();

        let sma = config
            .sma_windows
            .iter()
            .chain(extra_sma_windows)
            .filter(|&&w| w > 0)
            .map(|&w| (w, sma_of_series(&closes, w)))
            .collect();

        let macd = macd_of_series(
            &closes,
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        );
        let bands = bollinger_of_series(&closes, config.bollinger_period, config.bollinger_k);

        Self {
            len: closes.len(),
            sma,
            ema_fast: macd.ema_fast,
            ema_slow: macd.ema_slow,
            rsi: rsi_of_series(&closes, config.rsi_period),
            macd: macd.macd,
            signal_line: macd.signal_line,
            macd_histogram: macd.histogram,
            bb_upper: bands.upper,
            bb_middle: bands.middle,
            bb_lower: bands.lower,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full SMA series for a computed window.
    pub fn sma_series(&self, window: usize) -> Option<&[f64]> {
        self.sma.get(&window).map(|v| v.as_slice())
    }

    pub fn sma_windows(&self) -> impl Iterator<Item = usize> + '_ {
        self.sma.keys().copied()
    }

    /// SMA value at a bar; `None` during warm-up or for an uncomputed window.
    pub fn sma(&self, window: usize, index: usize) -> Option<f64> {
        self.sma_series(window).and_then(|s| defined_at(s, index))
    }

    pub fn rsi_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.rsi, index)
    }

    pub fn macd_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.macd, index)
    }

    pub fn signal_line_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.signal_line, index)
    }

    pub fn histogram_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.macd_histogram, index)
    }

    pub fn bb_upper_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.bb_upper, index)
    }

    pub fn bb_middle_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.bb_middle, index)
    }

    pub fn bb_lower_at(&self, index: usize) -> Option<f64> {
        defined_at(&self.bb_lower, index)
    }

    /// Named columns in export order: SMA_n ascending, then RSI, EMAs, MACD, bands.
    pub fn columns(&self) -> Vec<(String, &[f64])> {
        let mut cols: Vec<(String, &[f64])> = self
            .sma
            .iter()
            .map(|(w, s)| (format!("SMA_{w}"), s.as_slice()))
            .collect();
        cols.push(("RSI".into(), &self.rsi));
        cols.push(("EMA_fast".into(), &self.ema_fast));
        cols.push(("EMA_slow".into(), &self.ema_slow));
        cols.push(("MACD".into(), &self.macd));
        cols.push(("Signal_Line".into(), &self.signal_line));
        cols.push(("MACD_Histogram".into(), &self.macd_histogram));
        cols.push(("BB_Upper".into(), &self.bb_upper));
        cols.push(("BB_Middle".into(), &self.bb_middle));
        cols.push(("BB_Lower".into(), &self.bb_lower));
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn frame_is_index_aligned() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0).collect();
        let series = make_series(&closes);
        let frame = IndicatorFrame::compute(&series, &IndicatorConfig::default());

        assert_eq!(frame.len(), 250);
        for (name, col) in frame.columns() {
            assert_eq!(col.len(), 250, "column {name} misaligned");
        }
        assert_eq!(frame.sma_windows().collect::<Vec<_>>(), vec![10, 20, 50, 200]);
    }

    #[test]
    fn warmup_values_are_none() {
        let series = make_series(&[10.0; 30]);
        let frame = IndicatorFrame::compute(&series, &IndicatorConfig::default());

        assert_eq!(frame.sma(20, 18), None);
        assert_approx(frame.sma(20, 19).unwrap(), 10.0, DEFAULT_EPSILON);
        assert_eq!(frame.sma(50, 29), None);
        assert_eq!(frame.rsi_at(13), None);
        assert_eq!(frame.rsi_at(14), Some(100.0));
        assert_eq!(frame.macd_at(29), None);
        assert_eq!(frame.bb_upper_at(18), None);
        assert!(frame.bb_middle_at(19).is_some());
    }

    #[test]
    fn uncomputed_window_is_none() {
        let series = make_series(&[10.0; 30]);
        let frame = IndicatorFrame::compute(&series, &IndicatorConfig::default());
        assert_eq!(frame.sma(7, 25), None);
        assert!(frame.sma_series(7).is_none());
    }

    #[test]
    fn extra_windows_are_added() {
        let series = make_series(&[10.0; 30]);
        let config = IndicatorConfig {
            sma_windows: vec![5],
            ..IndicatorConfig::default()
        };
        let frame = IndicatorFrame::compute_with(&series, &config, &[3, 5]);
        assert_eq!(frame.sma_windows().collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn empty_series_gives_empty_frame() {
        let series = make_series(&[]);
        let frame = IndicatorFrame::compute(&series, &IndicatorConfig::default());
        assert!(frame.is_empty());
        assert_eq!(frame.rsi_at(0), None);
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: IndicatorConfig = serde_json::from_str(r#"{"rsi_period": 7}"#).unwrap();
        assert_eq!(config.rsi_period, 7);
        assert_eq!(config.sma_windows, vec![10, 20, 50, 200]);
        assert_eq!(config.macd_signal, 9);
    }
}
