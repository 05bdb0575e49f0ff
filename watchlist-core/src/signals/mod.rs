//! Signal generation: discrete per-rule signals and their composite.
//!
//! Each rule maps (series, indicator frame, bar index) to a [`Signal`]. Rules
//! never see position or backtest state. Undefined indicator values always
//! yield `Signal::Hold`, never a guessed value.

pub mod composite;
pub mod crossover;
pub mod threshold;

pub use composite::{composite_score, Action, SignalFrame};
pub use crossover::{MacdCross, SmaCross};
pub use threshold::{BollingerRule, RsiRule};

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::indicators::IndicatorFrame;

/// Discrete rule output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    #[default]
    Hold,
    Sell,
}

impl Signal {
    /// +1 for Buy, -1 for Sell, 0 for Hold.
    pub fn value(self) -> f64 {
        match self {
            Signal::Buy => 1.0,
            Signal::Hold => 0.0,
            Signal::Sell => -1.0,
        }
    }

    pub fn is_hold(self) -> bool {
        self == Signal::Hold
    }
}

/// A single signal rule.
pub trait SignalRule: Send + Sync {
    /// Human-readable name (e.g., "sma_cross").
    fn name(&self) -> &str;

    /// Evaluate the rule at `index`, using only bars `0..=index`.
    fn evaluate(&self, series: &PriceSeries, frame: &IndicatorFrame, index: usize) -> Signal;
}

/// Rule toggles and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub sma_cross: bool,
    pub rsi: bool,
    pub macd_cross: bool,
    pub bollinger: bool,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Composite magnitude at or beyond which a bar is actionable.
    pub action_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sma_cross: true,
            rsi: true,
            macd_cross: true,
            bollinger: true,
            sma_fast: 50,
            sma_slow: 200,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            action_threshold: 0.5,
        }
    }
}

impl SignalConfig {
    /// Only the SMA-cross rule enabled.
    pub fn sma_cross_only() -> Self {
        Self {
            rsi: false,
            macd_cross: false,
            bollinger: false,
            ..Self::default()
        }
    }

    /// SMA windows the enabled rules read from the indicator frame.
    pub fn required_sma_windows(&self) -> Vec<usize> {
        if self.sma_cross {
            vec![self.sma_fast, self.sma_slow]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_values() {
        assert_eq!(Signal::Buy.value(), 1.0);
        assert_eq!(Signal::Sell.value(), -1.0);
        assert_eq!(Signal::Hold.value(), 0.0);
        assert!(Signal::default().is_hold());
    }

    #[test]
    fn required_windows_follow_toggle() {
        assert_eq!(SignalConfig::default().required_sma_windows(), vec![50, 200]);
        let config = SignalConfig {
            sma_cross: false,
            ..SignalConfig::default()
        };
        assert!(config.required_sma_windows().is_empty());
    }

    #[test]
    fn sma_cross_only_disables_the_rest() {
        let config = SignalConfig::sma_cross_only();
        assert!(config.sma_cross);
        assert!(!config.rsi && !config.macd_cross && !config.bollinger);
    }
}
