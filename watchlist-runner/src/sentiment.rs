//! Language-model headline scoring.
//!
//! Sends one chat-completions request per headline to an OpenAI-compatible
//! endpoint and parses the free-text reply into a [`SentimentScore`]. A reply
//! that does not lead with a usable 1..=10 rating is an error, never a guess.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SentimentConfig;
use crate::provider::{ProviderError, SentimentScore, SentimentScorer};

/// Build the rating prompt for `headline`.
pub fn sentiment_prompt(headline: &str) -> String {
    format!(
        "Rate this headline from 1 (very bearish) to 10 (very bullish): {headline}\n\
         Reply with the number first, then a one-line reason."
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions scorer.
pub struct ChatSentimentScorer {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatSentimentScorer {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::from_transport)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &SentimentConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl SentimentScorer for ChatSentimentScorer {
    fn name(&self) -> &str {
        "chat_completions"
    }

    fn score(&self, headline: &str) -> Result<SentimentScore, ProviderError> {
        let prompt = sentiment_prompt(headline);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(ProviderError::from_transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                provider: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let chat: ChatResponse = resp
            .json()
            .map_err(|e| ProviderError::MalformedResponse(format!("chat response: {e}")))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::MalformedResponse("reply has no content".into()))?;

        debug!(model = %self.model, reply = %content, "sentiment reply");
        parse_sentiment_reply(&content)
    }
}

/// Parse a model reply into a score and reasoning.
///
/// The rating is the first number that either leads the reply or follows a
/// rating word ("rate", "rating", "score") in the same clause. Scale phrases
/// like "1 to 10", "1-10" and "/10" are never ratings. The rating must lie in
/// 1..=10; the text after it (minus a trailing "/10" and separators) is the
/// reasoning. Anything else is malformed.
pub fn parse_sentiment_reply(reply: &str) -> Result<SentimentScore, ProviderError> {
    let malformed = || ProviderError::MalformedResponse(format!("no 1-10 rating in reply: {reply:?}"));

    let (start, end) = rating_span(reply).ok_or_else(malformed)?;
    let negative = reply[..start].ends_with('-')
        && reply[..start - 1]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || c == ':');
    let score: f64 = reply[start..end].parse().map_err(|_| malformed())?;
    if negative || !(SentimentScore::MIN..=SentimentScore::MAX).contains(&score) {
        return Err(malformed());
    }

    let rest = reply[end..].trim_start();
    let rest = rest.strip_prefix("/10").unwrap_or(rest);
    let reasoning = rest
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ':' | ';' | '-' | ')'))
        .trim()
        .to_string();

    Ok(SentimentScore { score, reasoning })
}

const RATING_CUES: [&str; 6] = ["rate", "rated", "rating", "score", "scored", "sentiment"];

fn rating_span(reply: &str) -> Option<(usize, usize)> {
    let mut inside_scale = false;
    for (start, end) in number_spans(reply) {
        if std::mem::take(&mut inside_scale) || reply[..start].ends_with('/') {
            continue;
        }
        if opens_scale(&reply[end..]) {
            inside_scale = true;
            continue;
        }
        let before = &reply[..start];
        if leads(before) || clause_has_cue(before) {
            return Some((start, end));
        }
    }
    None
}

/// True for the text after "1" in "1 to 10" or "1-10".
fn opens_scale(after: &str) -> bool {
    let after = after.trim_start();
    let Some(upper) = after
        .strip_prefix("to ")
        .or_else(|| after.strip_prefix('-'))
        .or_else(|| after.strip_prefix('\u{2013}'))
    else {
        return false;
    };
    upper
        .trim_start()
        .strip_prefix("10")
        .is_some_and(|tail| !tail.starts_with(|c: char| c.is_ascii_digit()))
}

fn leads(before: &str) -> bool {
    before
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '"' | '#'))
        .is_empty()
}

fn clause_has_cue(before: &str) -> bool {
    let clause_start = before
        .rfind(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | '\n'))
        .map_or(0, |i| i + 1);
    before[clause_start..]
        .split(|c: char| !c.is_ascii_alphabetic())
        .any(|word| RATING_CUES.iter().any(|cue| word.eq_ignore_ascii_case(cue)))
}

/// Byte spans of every integer or decimal token, in order.
fn number_spans(s: &str) -> Vec<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        spans.push((start, i));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_headline() {
        let prompt = sentiment_prompt("IONQ beats estimates");
        assert!(prompt.starts_with(
            "Rate this headline from 1 (very bearish) to 10 (very bullish): IONQ beats estimates"
        ));
    }

    #[test]
    fn parses_bare_number() {
        let s = parse_sentiment_reply("7").unwrap();
        assert_eq!(s.score, 7.0);
        assert_eq!(s.reasoning, "");
    }

    #[test]
    fn parses_number_with_reason() {
        let s = parse_sentiment_reply("8 - Strong technical progress signals growth.").unwrap();
        assert_eq!(s.score, 8.0);
        assert_eq!(s.reasoning, "Strong technical progress signals growth.");
    }

    #[test]
    fn parses_out_of_ten_and_prose() {
        let s = parse_sentiment_reply("I'd rate this 6.5/10. Mixed signals.").unwrap();
        assert_eq!(s.score, 6.5);
        assert_eq!(s.reasoning, "Mixed signals.");

        let s = parse_sentiment_reply("Rating: 10\nVery bullish breakthrough").unwrap();
        assert_eq!(s.score, 10.0);
        assert_eq!(s.reasoning, "Very bullish breakthrough");
    }

    #[test]
    fn rejects_missing_or_out_of_range() {
        for reply in ["", "Bullish!", "0", "11 - huge", "42", "Score: -3"] {
            assert!(
                matches!(
                    parse_sentiment_reply(reply),
                    Err(ProviderError::MalformedResponse(_))
                ),
                "accepted {reply:?}"
            );
        }
    }

    #[test]
    fn scale_phrase_is_not_the_rating() {
        let s = parse_sentiment_reply("On a scale of 1 to 10, I'd rate this an 8. Strong news.")
            .unwrap();
        assert_eq!(s.score, 8.0);
        assert_eq!(s.reasoning, "Strong news.");

        let s = parse_sentiment_reply("Rating (1-10): 3 - dilution risk").unwrap();
        assert_eq!(s.score, 3.0);
        assert_eq!(s.reasoning, "dilution risk");
    }

    #[test]
    fn stray_number_without_cue_is_malformed() {
        for reply in [
            "On a scale of 1 to 10, this looks bullish.",
            "Shares rose 4% after the Q2 report.",
        ] {
            assert!(
                matches!(
                    parse_sentiment_reply(reply),
                    Err(ProviderError::MalformedResponse(_))
                ),
                "accepted {reply:?}"
            );
        }
    }

    #[test]
    fn hyphenated_prefix_is_not_a_sign() {
        let s = parse_sentiment_reply("Score-7").unwrap();
        assert_eq!(s.score, 7.0);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let config = SentimentConfig {
            api_key_env: "WATCHLIST_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..SentimentConfig::default()
        };
        assert!(matches!(
            ChatSentimentScorer::from_config(&config),
            Err(ProviderError::MissingApiKey { var }) if var == "WATCHLIST_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
