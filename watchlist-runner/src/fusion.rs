//! Technical + sentiment fusion.
//!
//! The technical composite (at the last bar, in [-1, 1]) and the normalized
//! sentiment score (in [-1, 1]) are combined as a weighted mean over whichever
//! inputs are available. Without technical data there is no decision at all,
//! whatever the headline says.

use serde::{Deserialize, Serialize};

use crate::provider::SentimentScore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub technical_weight: f64,
    pub sentiment_weight: f64,
    /// Fused magnitude at or beyond which the decision is Buy or Sell.
    pub threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            technical_weight: 0.6,
            sentiment_weight: 0.4,
            threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Buy,
    Hold,
    Sell,
    /// No technical data to decide on.
    Unavailable,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Hold => "HOLD",
            Decision::Sell => "SELL",
            Decision::Unavailable => "N/A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSignal {
    pub decision: Decision,
    pub score: Option<f64>,
    pub technical: Option<f64>,
    /// Sentiment on the [-1, 1] scale.
    pub sentiment: Option<f64>,
}

pub fn fuse(
    technical: Option<f64>,
    sentiment: Option<&SentimentScore>,
    config: &FusionConfig,
) -> FusedSignal {
    let sentiment = sentiment.map(SentimentScore::normalized);
    let Some(technical) = technical.filter(|t| !t.is_nan()) else {
        return FusedSignal {
            decision: Decision::Unavailable,
            score: None,
            technical: None,
            sentiment,
        };
    };

    let mut weighted = config.technical_weight * technical;
    let mut total_weight = config.technical_weight;
    if let Some(s) = sentiment {
        weighted += config.sentiment_weight * s;
        total_weight += config.sentiment_weight;
    }
    let score = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    };

    let decision = if score >= config.threshold {
        Decision::Buy
    } else if score <= -config.threshold {
        Decision::Sell
    } else {
        Decision::Hold
    };

    FusedSignal {
        decision,
        score: Some(score),
        technical: Some(technical),
        sentiment,
    }
}
