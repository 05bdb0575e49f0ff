//! Plain-text watchlist report.

use std::fmt::Write as _;

use crate::fusion::Decision;
use crate::pipeline::{Analysis, HeadlineOutcome, SentimentOutcome, StopSource, TechnicalAnalysis, TickerReport};

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

fn fmt_levels(levels: &[f64]) -> String {
    if levels.is_empty() {
        return "none".into();
    }
    levels
        .iter()
        .map(|l| format!("{l:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn decision_marker(decision: Decision) -> &'static str {
    match decision {
        Decision::Buy => "🟢",
        Decision::Sell => "🔴",
        Decision::Hold => "🟡",
        Decision::Unavailable => "⚪",
    }
}

fn render_technical(out: &mut String, t: &TechnicalAnalysis) {
    let last = t.series.len().saturating_sub(1);
    let ind = &t.indicators;

    let smas: Vec<String> = ind
        .sma_windows()
        .map(|w| format!("SMA_{w} {}", fmt_opt(ind.sma(w, last), 2)))
        .collect();
    let _ = writeln!(out, "  Indicators: {}", smas.join(" | "));
    let _ = writeln!(
        out,
        "              RSI {} | MACD {} / signal {} | BB {} to {}",
        fmt_opt(ind.rsi_at(last), 1),
        fmt_opt(ind.macd_at(last), 4),
        fmt_opt(ind.signal_line_at(last), 4),
        fmt_opt(ind.bb_lower_at(last), 2),
        fmt_opt(ind.bb_upper_at(last), 2),
    );
    let _ = writeln!(
        out,
        "  Levels: support {} | resistance {}",
        fmt_levels(&t.levels.support),
        fmt_levels(&t.levels.resistance)
    );

    let fired: Vec<String> = t
        .signals
        .columns()
        .iter()
        .filter_map(|(name, signals)| {
            signals
                .get(last)
                .filter(|s| !s.is_hold())
                .map(|s| format!("{name} {s:?}"))
        })
        .collect();
    let _ = writeln!(
        out,
        "  Signals: {} -> composite {} ({:?})",
        if fired.is_empty() { "none".to_string() } else { fired.join(", ") },
        fmt_opt(t.composite(), 2),
        t.action()
    );

    let bt = &t.backtest;
    if bt.is_empty() {
        let _ = writeln!(out, "  Backtest: not enough bars");
    } else {
        let _ = writeln!(
            out,
            "  Backtest: total {} | return {:+.2}% | Sharpe {:.2} | max DD {:.2}% | {:?} | trades {} (win {:.0}%)",
            fmt_opt(bt.final_equity(), 2),
            bt.total_return * 100.0,
            bt.sharpe,
            bt.max_drawdown * 100.0,
            bt.final_position,
            t.trade_stats.trade_count,
            t.trade_stats.win_rate * 100.0,
        );
    }

    match &t.plan {
        Some(plan) => {
            let source = match plan.stop_source {
                StopSource::Support => "support",
                StopSource::DefaultPercent => "default %",
            };
            let _ = writeln!(
                out,
                "  Risk: Kelly {:.2} | {:.0} shares at {:.2}, stop {:.2} ({source}), risking {:.2}",
                t.kelly, plan.shares, plan.entry, plan.stop, plan.risk_amount
            );
        }
        None => {
            let _ = writeln!(out, "  Risk: Kelly {:.2} | no usable close to size from", t.kelly);
        }
    }
}

/// Render one ticker's section.
pub fn render_ticker(report: &TickerReport) -> String {
    let mut out = String::new();

    match &report.analysis {
        Analysis::Ready(t) => {
            let _ = writeln!(
                out,
                "📊 {}  ({} bars, last {})",
                report.ticker,
                t.series.len(),
                fmt_opt(t.last_close(), 2)
            );
            render_technical(&mut out, t);
        }
        Analysis::NoData => {
            let _ = writeln!(out, "📊 {}  (no price data)", report.ticker);
        }
        Analysis::Failed(e) => {
            let _ = writeln!(out, "📊 {}  (price fetch failed: {e})", report.ticker);
        }
    }

    match (&report.headline, &report.sentiment) {
        (HeadlineOutcome::Found(h), SentimentOutcome::Scored(s)) => {
            let _ = writeln!(out, "  🧠 Vibe Score: {}/10 based on: {h}", s.score);
            if !s.reasoning.is_empty() {
                let _ = writeln!(out, "     {}", s.reasoning);
            }
        }
        (HeadlineOutcome::Found(h), SentimentOutcome::Failed(e)) => {
            let _ = writeln!(out, "  🧠 Vibe Score: unavailable ({e}) for: {h}");
        }
        (HeadlineOutcome::Found(h), _) => {
            let _ = writeln!(out, "  📰 {h}");
        }
        (HeadlineOutcome::NoHeadline, _) => {
            let _ = writeln!(out, "  📰 no recent headline");
        }
        (HeadlineOutcome::Failed(e), _) => {
            let _ = writeln!(out, "  📰 headline unavailable ({e})");
        }
    }

    let fused = &report.fused;
    let _ = writeln!(
        out,
        "  {} Decision: {} (fused {})",
        decision_marker(fused.decision),
        fused.decision.label(),
        fmt_opt(fused.score, 2)
    );
    out
}

/// Render the whole watchlist.
pub fn render_report(reports: &[TickerReport]) -> String {
    let mut out = String::from("📈 Watchlist\n");
    for report in reports {
        out.push_str(&"─".repeat(60));
        out.push('\n');
        out.push_str(&render_ticker(report));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::FusedSignal;
    use crate::provider::{ProviderError, SentimentScore};

    fn report(analysis: Analysis, headline: HeadlineOutcome, sentiment: SentimentOutcome) -> TickerReport {
        TickerReport {
            ticker: "IONQ".into(),
            analysis,
            headline,
            sentiment,
            fused: FusedSignal {
                decision: Decision::Unavailable,
                score: None,
                technical: None,
                sentiment: None,
            },
        }
    }

    #[test]
    fn no_data_with_scored_headline() {
        let text = render_ticker(&report(
            Analysis::NoData,
            HeadlineOutcome::Found("IONQ just posted strong quantum advancement news".into()),
            SentimentOutcome::Scored(SentimentScore {
                score: 8.0,
                reasoning: "Positive progress.".into(),
            }),
        ));
        assert!(text.contains("IONQ  (no price data)"));
        assert!(text.contains("🧠 Vibe Score: 8/10 based on: IONQ just posted"));
        assert!(text.contains("Positive progress."));
        assert!(text.contains("Decision: N/A (fused n/a)"));
    }

    #[test]
    fn failures_are_shown_not_hidden() {
        let text = render_ticker(&report(
            Analysis::Failed(ProviderError::NetworkUnreachable("timeout".into())),
            HeadlineOutcome::Found("h".into()),
            SentimentOutcome::Failed(ProviderError::MalformedResponse("no 1-10 rating".into())),
        ));
        assert!(text.contains("price fetch failed: network unreachable: timeout"));
        assert!(text.contains("Vibe Score: unavailable (malformed response: no 1-10 rating)"));
    }
}
