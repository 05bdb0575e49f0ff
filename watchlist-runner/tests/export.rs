//! CSV export tests against a temporary directory.

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;
use watchlist_core::domain::{PriceBar, PriceSeries};
use watchlist_core::signals::SignalConfig;
use watchlist_runner::{
    analyze_series, export_frame_csv, fuse, write_reports, Analysis, ExportError,
    HeadlineOutcome, SentimentOutcome, TickerReport, WatchlistConfig,
};

fn rally_series() -> PriceSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
    let bars = (0..300)
        .map(|i| {
            let close = if i < 200 {
                150.0 - 0.25 * i as f64
            } else {
                100.0 + (i - 199) as f64
            };
            PriceBar {
                timestamp: base + Duration::days(i),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 10_000,
            }
        })
        .collect();
    PriceSeries::new("RALLY", bars).unwrap()
}

fn config() -> WatchlistConfig {
    WatchlistConfig {
        signals: SignalConfig::sma_cross_only(),
        ..WatchlistConfig::default()
    }
}

fn report(ticker: &str, analysis: Analysis) -> TickerReport {
    let technical = analysis.technical().and_then(|t| t.composite());
    TickerReport {
        ticker: ticker.into(),
        fused: fuse(technical, None, &config().fusion),
        analysis,
        headline: HeadlineOutcome::NoHeadline,
        sentiment: SentimentOutcome::NotScored,
    }
}

#[test]
fn frame_has_every_column_and_row() {
    let analysis = analyze_series(rally_series(), &config());
    let csv_text = export_frame_csv(analysis.technical().unwrap()).unwrap();

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    for column in [
        "timestamp",
        "close",
        "SMA_50",
        "SMA_200",
        "RSI",
        "MACD",
        "Signal_Line",
        "BB_Upper",
        "sma_cross",
        "composite",
        "position",
        "total",
    ] {
        assert!(headers.iter().any(|h| h == column), "missing column {column}");
    }

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 300);

    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    // Warm-up cells are empty, not zero.
    assert_eq!(&rows[0][col("SMA_200")], "");
    assert!(!rows[199][col("SMA_200")].is_empty());

    assert_eq!(&rows[244][col("sma_cross")], "1");
    assert_eq!(&rows[243][col("position")], "flat");
    assert_eq!(&rows[244][col("position")], "long");
    assert_eq!(&rows[299][col("total")], "10055.00");
}

#[test]
fn write_reports_creates_frame_and_summary_files() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("exports");
    let reports = vec![
        report("RALLY", analyze_series(rally_series(), &config())),
        report("EMPTY", Analysis::NoData),
    ];

    let written = write_reports(&out, &reports).unwrap();
    assert_eq!(written.len(), 2);
    assert!(out.join("RALLY_frame.csv").exists());
    assert!(!out.join("EMPTY_frame.csv").exists());

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    let mut reader = csv::Reader::from_reader(summary.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "RALLY");
    assert_eq!(&rows[0][1], "ok");
    assert_eq!(&rows[1][0], "EMPTY");
    assert_eq!(&rows[1][1], "no_data");
    assert_eq!(&rows[1][12], "N/A");
}

#[test]
fn ticker_with_path_separators_is_not_written() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("exports");
    let reports = vec![report("../escape", analyze_series(rally_series(), &config()))];

    let err = write_reports(&out, &reports).unwrap_err();
    assert!(matches!(err, ExportError::UnsafeTicker(t) if t == "../escape"));
    assert!(!dir.path().join("escape_frame.csv").exists());
    assert!(!out.join("summary.csv").exists());
}
