//! Composite signal: the equal-weight mean of whichever rules fired.

use serde::{Deserialize, Serialize};

use super::crossover::{MacdCross, SmaCross};
use super::threshold::{BollingerRule, RsiRule};
use super::{Signal, SignalConfig, SignalRule};
use crate::domain::PriceSeries;
use crate::indicators::IndicatorFrame;

/// Sum of nonzero signals divided by their count; 0 when nothing fired.
///
/// Two agreeing rules score the same as one, so the composite measures
/// agreement among the rules that spoke rather than how many rules exist.
pub fn composite_score(signals: &[Signal]) -> f64 {
    let (sum, count) = signals
        .iter()
        .filter(|s| !s.is_hold())
        .fold((0.0, 0usize), |(sum, count), s| (sum + s.value(), count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Thresholded composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// `>= threshold` buys, `<= -threshold` sells, anything between holds.
    pub fn from_composite(composite: f64, threshold: f64) -> Self {
        if composite >= threshold {
            Action::Buy
        } else if composite <= -threshold {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

/// Per-bar rule outputs and composite, index-aligned with the series.
///
/// A disabled rule contributes a column of `Signal::Hold`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    pub sma_cross: Vec<Signal>,
    pub rsi: Vec<Signal>,
    pub macd_cross: Vec<Signal>,
    pub bollinger: Vec<Signal>,
    pub composite: Vec<f64>,
    threshold: f64,
}

impl SignalFrame {
    pub fn generate(series: &PriceSeries, frame: &IndicatorFrame, config: &SignalConfig) -> Self {
        let n = series.len();
        let run = |enabled: bool, rule: &dyn SignalRule| -> Vec<Signal> {
            if !enabled {
                return vec![Signal::Hold; n];
            }
            (0..n).map(|i| rule.evaluate(series, frame, i)).collect()
        };

        let sma_cross = run(
            config.sma_cross,
            &SmaCross::new(config.sma_fast, config.sma_slow),
        );
        let rsi = run(
            config.rsi,
            &RsiRule::new(config.rsi_oversold, config.rsi_overbought),
        );
        let macd_cross = run(config.macd_cross, &MacdCross);
        let bollinger = run(config.bollinger, &BollingerRule);

        let composite = (0..n)
            .map(|i| composite_score(&[sma_cross[i], rsi[i], macd_cross[i], bollinger[i]]))
            .collect();

        Self {
            sma_cross,
            rsi,
            macd_cross,
            bollinger,
            composite,
            threshold: config.action_threshold,
        }
    }

    /// Wrap an externally computed composite; rule columns are all Hold.
    pub fn from_composite(composite: Vec<f64>, threshold: f64) -> Self {
        let n = composite.len();
        Self {
            sma_cross: vec![Signal::Hold; n],
            rsi: vec![Signal::Hold; n],
            macd_cross: vec![Signal::Hold; n],
            bollinger: vec![Signal::Hold; n],
            composite,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.composite.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composite.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn action_at(&self, index: usize) -> Action {
        self.composite
            .get(index)
            .map(|&c| Action::from_composite(c, self.threshold))
            .unwrap_or(Action::Hold)
    }

    pub fn last_composite(&self) -> Option<f64> {
        self.composite.last().copied()
    }

    /// Rule name and column, in export order.
    pub fn columns(&self) -> [(&'static str, &[Signal]); 4] {
        [
            ("sma_cross", self.sma_cross.as_slice()),
            ("rsi_signal", self.rsi.as_slice()),
            ("macd_cross", self.macd_cross.as_slice()),
            ("bollinger_signal", self.bollinger.as_slice()),
        ]
    }
}
