//! PriceSeries: an ordered bar sequence for one ticker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::PriceBar;

/// Structural problems with a bar sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("timestamp at bar {index} is not after the previous bar")]
    NonIncreasingTimestamp { index: usize },
}

/// Ordered bars for one ticker over one requested period/interval.
///
/// Timestamps are strictly increasing. An empty series is a legal value: every
/// analysis entry point treats it as "no data" rather than as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSeries")]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

/// Wire shape of a series before the timestamp ordering check.
#[derive(Deserialize)]
struct UncheckedSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl TryFrom<UncheckedSeries> for PriceSeries {
    type Error = SeriesError;

    fn try_from(raw: UncheckedSeries) -> Result<Self, Self::Error> {
        Self::new(raw.ticker, raw.bars)
    }
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NonIncreasingTimestamp { index: pos + 1 });
        }
        Ok(Self {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            bars: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}
