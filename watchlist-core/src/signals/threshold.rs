//! Level-triggered rules: RSI bounds and Bollinger band breaches.
//!
//! These hold their signal for as long as the condition holds.

use super::{Signal, SignalRule};
use crate::domain::PriceSeries;
use crate::indicators::IndicatorFrame;

/// Buy while RSI is below `oversold`, sell while above `overbought`.
#[derive(Debug, Clone)]
pub struct RsiRule {
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiRule {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        assert!(oversold < overbought, "oversold must be < overbought");
        Self {
            oversold,
            overbought,
        }
    }
}

impl Default for RsiRule {
    fn default() -> Self {
        Self::new(30.0, 70.0)
    }
}

impl SignalRule for RsiRule {
    fn name(&self) -> &str {
        "rsi"
    }

    fn evaluate(&self, _series: &PriceSeries, frame: &IndicatorFrame, index: usize) -> Signal {
        match frame.rsi_at(index) {
            Some(rsi) if rsi < self.oversold => Signal::Buy,
            Some(rsi) if rsi > self.overbought => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

/// Buy while close is below the lower band, sell while above the upper band.
#[derive(Debug, Clone, Default)]
pub struct BollingerRule;

impl SignalRule for BollingerRule {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn evaluate(&self, series: &PriceSeries, frame: &IndicatorFrame, index: usize) -> Signal {
        let Some(close) = series.bars().get(index).map(|b| b.close) else {
            return Signal::Hold;
        };
        if close.is_nan() {
            return Signal::Hold;
        }
        match (frame.bb_lower_at(index), frame.bb_upper_at(index)) {
            (Some(lower), _) if close < lower => Signal::Buy,
            (_, Some(upper)) if close > upper => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}
