//! Yahoo Finance providers.
//!
//! Prices come from the v8 chart API (`range` + `interval` query), headlines
//! from the v1 search API. Yahoo has no official API and changes its response
//! format without notice, so every field is optional on the way in and parsing
//! failures surface as `MalformedResponse`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use watchlist_core::domain::{PriceBar, PriceSeries};

use crate::provider::{
    DateRange, HeadlineProvider, PriceProvider, PriceRequest, ProviderError,
};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ── Chart API wire types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

// ── Search API wire types ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsItem {
    title: Option<String>,
    provider_publish_time: Option<i64>,
}

fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, ProviderError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ProviderError::from_transport)
}

/// Turn a non-success status into a `ProviderError`.
fn check_status(
    provider: &str,
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ProviderError> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ProviderError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    if !status.is_success() {
        return Err(ProviderError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

/// Yahoo Finance chart API price provider.
pub struct YahooChartProvider {
    client: reqwest::blocking::Client,
}

impl YahooChartProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    /// Parse the chart API response into a series.
    ///
    /// An unknown symbol, a missing timestamp array, or a window with no
    /// trading bars is "no data", not an error.
    fn parse_response(
        ticker: &str,
        resp: ChartResponse,
    ) -> Result<Option<PriceSeries>, ProviderError> {
        let Some(result) = resp.chart.result else {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => Ok(None),
                Some(err) => Err(ProviderError::MalformedResponse(format!(
                    "{}: {}",
                    err.code, err.description
                ))),
                None => Err(ProviderError::MalformedResponse(
                    "empty result with no error".into(),
                )),
            };
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(None);
        };
        let Some(timestamps) = data.timestamp else {
            return Ok(None);
        };
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
                ProviderError::MalformedResponse(format!("invalid timestamp: {ts}"))
            })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Halted or not-yet-printed intervals come back all null
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
                continue;
            }

            // The live bar can repeat the previous timestamp
            if bars.last().is_some_and(|prev| prev.timestamp >= timestamp) {
                debug!(ticker, ts, "dropping non-increasing chart timestamp");
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Ok(None);
        }
        Ok(Some(PriceSeries::new(ticker, bars)?))
    }
}

impl PriceProvider for YahooChartProvider {
    fn name(&self) -> &str {
        "yahoo_chart"
    }

    fn fetch(&self, request: &PriceRequest) -> Result<Option<PriceSeries>, ProviderError> {
        let url = format!("{CHART_URL}/{}", request.ticker);
        debug!(ticker = %request.ticker, period = %request.period, interval = %request.interval, "chart request");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("range", request.period.as_str()),
                ("interval", request.interval.as_str()),
            ])
            .send()
            .map_err(ProviderError::from_transport)?;

        // Unknown symbols come back as 404 with a well-formed error body
        let resp = if resp.status() == reqwest::StatusCode::NOT_FOUND {
            resp
        } else {
            check_status(self.name(), resp)?
        };

        let chart: ChartResponse = resp.json().map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "failed to parse chart for {}: {e}",
                request.ticker
            ))
        })?;

        let series = Self::parse_response(&request.ticker, chart)?;
        if series.is_none() {
            warn!(ticker = %request.ticker, "chart returned no bars");
        }
        Ok(series)
    }
}

/// Yahoo Finance search API headline provider.
pub struct YahooNewsProvider {
    client: reqwest::blocking::Client,
    news_count: usize,
}

impl YahooNewsProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(timeout)?,
            news_count: 10,
        })
    }

    /// Newest titled item published inside `range`.
    fn pick_headline(resp: SearchResponse, range: &DateRange) -> Option<String> {
        resp.news
            .into_iter()
            .filter_map(|item| {
                let title = item.title?.trim().to_string();
                let published = DateTime::<Utc>::from_timestamp(item.provider_publish_time?, 0)?;
                (!title.is_empty() && range.contains(published)).then_some((published, title))
            })
            .max_by_key(|(published, _)| *published)
            .map(|(_, title)| title)
    }
}

impl HeadlineProvider for YahooNewsProvider {
    fn name(&self) -> &str {
        "yahoo_news"
    }

    fn headline(&self, ticker: &str, range: &DateRange) -> Result<Option<String>, ProviderError> {
        let news_count = self.news_count.to_string();
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", ticker),
                ("quotesCount", "0"),
                ("newsCount", news_count.as_str()),
            ])
            .send()
            .map_err(ProviderError::from_transport)?;
        let resp = check_status(self.name(), resp)?;

        let search: SearchResponse = resp.json().map_err(|e| {
            ProviderError::MalformedResponse(format!("failed to parse news for {ticker}: {e}"))
        })?;
        Ok(Self::pick_headline(search, range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_intraday_chart() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1717075800,1717076100,1717076400],
                "indicators":{"quote":[{
                    "open":[10.0,10.2,null],
                    "high":[10.5,10.4,null],
                    "low":[9.9,10.1,null],
                    "close":[10.2,10.3,null],
                    "volume":[1000,800,null]
                }]}
            }],"error":null}}"#,
        );
        let series = YahooChartProvider::parse_response("IONQ", resp)
            .unwrap()
            .unwrap();

        assert_eq!(series.ticker(), "IONQ");
        assert_eq!(series.len(), 2, "all-null bar is skipped");
        assert_eq!(series.closes(), vec![10.2, 10.3]);
        assert_eq!(series.bars()[1].volume, 800);
    }

    #[test]
    fn partial_bar_keeps_nan_fields() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1717075800],
                "indicators":{"quote":[{
                    "open":[10.0],"high":[null],"low":[9.5],"close":[10.1],"volume":[null]
                }]}
            }],"error":null}}"#,
        );
        let series = YahooChartProvider::parse_response("X", resp).unwrap().unwrap();
        assert!(series.bars()[0].high.is_nan());
        assert_eq!(series.bars()[0].volume, 0);
    }

    #[test]
    fn repeated_live_timestamp_is_dropped() {
        let resp = chart(
            r#"{"chart":{"result":[{
                "timestamp":[1717075800,1717076100,1717076100],
                "indicators":{"quote":[{
                    "open":[1.0,2.0,3.0],"high":[1.0,2.0,3.0],
                    "low":[1.0,2.0,3.0],"close":[1.0,2.0,3.0],"volume":[1,1,1]
                }]}
            }],"error":null}}"#,
        );
        let series = YahooChartProvider::parse_response("X", resp).unwrap().unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn unknown_symbol_is_no_data() {
        let resp = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        assert_eq!(YahooChartProvider::parse_response("ZZZZ", resp), Ok(None));
    }

    #[test]
    fn missing_timestamps_is_no_data() {
        let resp = chart(r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#);
        assert_eq!(YahooChartProvider::parse_response("X", resp), Ok(None));
    }

    #[test]
    fn other_chart_error_is_malformed() {
        let resp = chart(
            r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input - interval=7m is not supported"}}}"#,
        );
        let err = YahooChartProvider::parse_response("X", resp).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(msg) if msg.contains("7m")));
    }

    #[test]
    fn picks_newest_headline_in_range() {
        let resp: SearchResponse = serde_json::from_str(
            r#"{"news":[
                {"title":"Older headline","providerPublishTime":1717000000},
                {"title":"Newest headline","providerPublishTime":1717100000},
                {"title":"Future headline","providerPublishTime":1817100000},
                {"title":"  ","providerPublishTime":1717200000},
                {"providerPublishTime":1717150000}
            ]}"#,
        )
        .unwrap();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 25).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
        );
        assert_eq!(
            YahooNewsProvider::pick_headline(resp, &range),
            Some("Newest headline".to_string())
        );
    }

    #[test]
    fn no_news_is_none() {
        let resp: SearchResponse = serde_json::from_str(r#"{"quotes":[]}"#).unwrap();
        let range = DateRange::ending_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 3);
        assert_eq!(YahooNewsProvider::pick_headline(resp, &range), None);
    }
}
