//! CSV export.
//!
//! - **Frame**: one row per bar with prices, every indicator column, every
//!   signal column, the composite, and the backtest position and total
//! - **Summary**: one row per ticker with the last-bar view and the decision
//!
//! Undefined indicator values are written as empty cells.

use std::path::{Path, PathBuf};

use thiserror::Error;
use watchlist_core::backtest::Position;

use crate::pipeline::{Analysis, TechnicalAnalysis, TickerReport};
use crate::provider::is_valid_ticker;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("ticker {0:?} cannot be used as a file name")]
    UnsafeTicker(String),
}

fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.6}")
    }
}

fn opt_cell(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.precision$}"))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

/// Combined per-bar frame for one ticker.
pub fn export_frame_csv(analysis: &TechnicalAnalysis) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let indicator_columns = analysis.indicators.columns();
    let signal_columns = analysis.signals.columns();

    let mut header: Vec<String> = ["timestamp", "open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(indicator_columns.iter().map(|(name, _)| name.clone()));
    header.extend(signal_columns.iter().map(|(name, _)| name.to_string()));
    header.extend(["composite", "position", "total"].map(String::from));
    wtr.write_record(&header)?;

    let backtest = &analysis.backtest;
    for (i, bar) in analysis.series.bars().iter().enumerate() {
        let mut row = vec![
            bar.timestamp.to_rfc3339(),
            cell(bar.open),
            cell(bar.high),
            cell(bar.low),
            cell(bar.close),
            bar.volume.to_string(),
        ];
        row.extend(
            indicator_columns
                .iter()
                .map(|(_, values)| values.get(i).copied().map_or_else(String::new, cell)),
        );
        row.extend(signal_columns.iter().map(|(_, signals)| {
            signals
                .get(i)
                .map_or_else(String::new, |s| format!("{}", s.value() as i8))
        }));
        row.push(opt_cell(analysis.signals.composite.get(i).copied(), 4));
        row.push(match backtest.positions.get(i) {
            Some(Position::Long) => "long".into(),
            Some(Position::Flat) => "flat".into(),
            None => String::new(),
        });
        row.push(opt_cell(backtest.equity_curve.get(i).copied(), 2));
        wtr.write_record(&row)?;
    }

    finish(wtr)
}

/// One row per ticker.
///
/// Columns: ticker, status, last_close, composite, action, sharpe,
/// max_drawdown, kelly, shares, stop, headline, sentiment, decision, fused_score
pub fn export_summary_csv(reports: &[TickerReport]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "status",
        "last_close",
        "composite",
        "action",
        "sharpe",
        "max_drawdown",
        "kelly",
        "shares",
        "stop",
        "headline",
        "sentiment",
        "decision",
        "fused_score",
    ])?;

    for report in reports {
        let technical = report.analysis.technical();
        let status = match &report.analysis {
            Analysis::Ready(_) => "ok".to_string(),
            Analysis::NoData => "no_data".to_string(),
            Analysis::Failed(e) => format!("error: {e}"),
        };
        let plan = technical.and_then(|t| t.plan.as_ref());

        wtr.write_record([
            report.ticker.clone(),
            status,
            opt_cell(technical.and_then(TechnicalAnalysis::last_close), 4),
            opt_cell(technical.and_then(TechnicalAnalysis::composite), 4),
            technical.map_or_else(String::new, |t| format!("{:?}", t.action())),
            opt_cell(technical.map(|t| t.backtest.sharpe), 4),
            opt_cell(technical.map(|t| t.backtest.max_drawdown), 4),
            opt_cell(technical.map(|t| t.kelly), 4),
            opt_cell(plan.map(|p| p.shares), 2),
            opt_cell(plan.map(|p| p.stop), 4),
            report.headline.text().unwrap_or_default().to_string(),
            opt_cell(report.sentiment.score().map(|s| s.score), 1),
            report.fused.decision.label().to_string(),
            opt_cell(report.fused.score, 4),
        ])?;
    }

    finish(wtr)
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `{ticker}_frame.csv` for each analyzed ticker and `summary.csv`
/// under `dir`, creating it if needed. Returns the paths written.
pub fn write_reports(dir: &Path, reports: &[TickerReport]) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for report in reports {
        if let Some(technical) = report.analysis.technical() {
            if !is_valid_ticker(&report.ticker) {
                return Err(ExportError::UnsafeTicker(report.ticker.clone()));
            }
            let path = dir.join(format!("{}_frame.csv", report.ticker));
            write_file(&path, &export_frame_csv(technical)?)?;
            written.push(path);
        }
    }

    let summary = dir.join("summary.csv");
    write_file(&summary, &export_summary_csv(reports)?)?;
    written.push(summary);
    Ok(written)
}
