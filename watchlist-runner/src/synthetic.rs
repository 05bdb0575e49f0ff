//! Offline price provider.
//!
//! Generates a deterministic random walk per ticker: the RNG is seeded from
//! the BLAKE3 hash of the ticker, so the same ticker always yields the same
//! bars for the same request. Useful for demos and tests without network access.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use watchlist_core::domain::{PriceBar, PriceSeries};

use crate::provider::{PriceProvider, PriceRequest, ProviderError};

/// Regular US session, 09:30-16:00 New York, expressed in UTC (EDT).
const SESSION_OPEN_UTC: (u32, u32) = (13, 30);
const SESSION_MINUTES: u32 = 390;

/// Longest walk the provider will generate: ten years of sessions.
pub const MAX_SESSIONS: u32 = 252 * 10;

/// Per-session return range of the walk, scaled down for intraday bars.
const DAILY_RETURN_RANGE: f64 = 0.03;

pub struct SyntheticProvider {
    /// Last session the walk covers.
    anchor: NaiveDate,
    start_price: f64,
}

impl SyntheticProvider {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            start_price: 100.0,
        }
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    /// Bars for `ticker` covering `sessions` trading days at `bar_minutes`.
    ///
    /// `sessions` is clamped to [`MAX_SESSIONS`].
    pub fn generate(&self, ticker: &str, sessions: u32, bar_minutes: u32) -> Vec<PriceBar> {
        let sessions = sessions.min(MAX_SESSIONS);
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let bar_range = DAILY_RETURN_RANGE * (f64::from(bar_minutes) / f64::from(SESSION_MINUTES)).sqrt();
        let mut price = self.start_price;
        let mut bars = Vec::new();

        for day in trading_days_ending(self.anchor, sessions) {
            for offset in session_offsets(bar_minutes) {
                let Some(timestamp) = session_time(day, offset) else {
                    continue;
                };
                let ret: f64 = rng.gen_range(-bar_range..bar_range);
                let open = price;
                let close = price * (1.0 + ret);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..bar_range / 3.0));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..bar_range / 3.0));
                let volume = rng.gen_range(10_000..500_000u64);

                bars.push(PriceBar {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
                price = close;
            }
        }

        bars
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &PriceRequest) -> Result<Option<PriceSeries>, ProviderError> {
        let sessions = parse_period(&request.period)?;
        let bar_minutes = parse_interval(&request.interval)?;
        let bars = self.generate(&request.ticker, sessions, bar_minutes);
        Ok(Some(PriceSeries::new(request.ticker.clone(), bars)?))
    }
}

/// Trading sessions covered by a Yahoo-style period string.
pub fn parse_period(period: &str) -> Result<u32, ProviderError> {
    let unsupported = || ProviderError::UnsupportedRequest(format!("period '{period}'"));
    let (count, unit) = split_unit(period).ok_or_else(unsupported)?;
    let per_unit = match unit {
        "d" => 1,
        "wk" => 5,
        "mo" => 21,
        "y" => 252,
        _ => return Err(unsupported()),
    };
    let sessions = count.checked_mul(per_unit).ok_or_else(unsupported)?;
    if sessions == 0 || sessions > MAX_SESSIONS {
        return Err(unsupported());
    }
    Ok(sessions)
}

/// Bar length in minutes for a Yahoo-style interval string.
pub fn parse_interval(interval: &str) -> Result<u32, ProviderError> {
    let unsupported = || ProviderError::UnsupportedRequest(format!("interval '{interval}'"));
    let (count, unit) = split_unit(interval).ok_or_else(unsupported)?;
    let per_unit = match unit {
        "m" => 1,
        "h" => 60,
        "d" => SESSION_MINUTES,
        _ => return Err(unsupported()),
    };
    let minutes = count.checked_mul(per_unit).ok_or_else(unsupported)?;
    if minutes == 0 || (minutes > SESSION_MINUTES && unit != "d") || (unit == "d" && count != 1) {
        return Err(unsupported());
    }
    Ok(minutes)
}

fn split_unit(s: &str) -> Option<(u32, &str)> {
    let digits = s.find(|c: char| !c.is_ascii_digit())?;
    let count = s[..digits].parse().ok()?;
    Some((count, &s[digits..]))
}

fn trading_days_ending(anchor: NaiveDate, sessions: u32) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(sessions as usize);
    let mut day = anchor;
    while days.len() < sessions as usize {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day -= Duration::days(1);
    }
    days.reverse();
    days
}

fn session_offsets(bar_minutes: u32) -> impl Iterator<Item = u32> {
    (0..SESSION_MINUTES).step_by(bar_minutes as usize)
}

fn session_time(day: NaiveDate, offset_minutes: u32) -> Option<DateTime<Utc>> {
    let open = NaiveTime::from_hms_opt(SESSION_OPEN_UTC.0, SESSION_OPEN_UTC.1, 0)?;
    let at = day.and_time(open) + Duration::minutes(i64::from(offset_minutes));
    Some(at.and_utc())
}
