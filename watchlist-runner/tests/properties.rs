//! Property tests for reply parsing and fusion.

use proptest::prelude::*;
use watchlist_runner::{fuse, parse_sentiment_reply, Decision, FusionConfig, SentimentScore};

proptest! {
    /// Any in-range leading rating parses, whatever reason follows it.
    #[test]
    fn leading_rating_parses(score in 1u8..=10, reason in "[A-Za-z ,]{0,40}") {
        let reply = format!("{score} - {reason}");
        let parsed = parse_sentiment_reply(&reply).unwrap();
        prop_assert_eq!(parsed.score, f64::from(score));
        prop_assert_eq!(parsed.reasoning, reason.trim_start_matches([' ', ',']).trim().to_string());
    }

    /// Out-of-range ratings are rejected, never clamped.
    #[test]
    fn out_of_range_rating_rejected(score in 11u32..1000) {
        prop_assert!(parse_sentiment_reply(&score.to_string()).is_err());
    }

    /// The fused score stays on the [-1, 1] scale and agrees with the decision.
    #[test]
    fn fused_score_is_bounded(
        technical in -1.0..=1.0_f64,
        rating in proptest::option::of(1.0..=10.0_f64),
        technical_weight in 0.01..1.0_f64,
        sentiment_weight in 0.0..1.0_f64,
        threshold in 0.05..=1.0_f64,
    ) {
        let config = FusionConfig { technical_weight, sentiment_weight, threshold };
        let score = rating.map(|score| SentimentScore { score, reasoning: String::new() });
        let fused = fuse(Some(technical), score.as_ref(), &config);

        let value = fused.score.unwrap();
        prop_assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&value));
        match fused.decision {
            Decision::Buy => prop_assert!(value >= threshold),
            Decision::Sell => prop_assert!(value <= -threshold),
            Decision::Hold => prop_assert!(value.abs() < threshold),
            Decision::Unavailable => prop_assert!(false, "technical input was present"),
        }
    }
}
