//! Watchlist CLI: analyze a ticker watchlist, backtest, levels, and sizing.
//!
//! Commands:
//! - `watch`: run the full pipeline for every ticker and print the report
//! - `backtest`: replay the composite signal for one ticker
//! - `levels`: support/resistance levels for one ticker
//! - `size`: position size from account, risk %, entry, and stop
//! - `kelly`: capped Kelly fraction from win rate and win/loss ratio

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use watchlist_core::risk::{kelly_fraction, position_size, KELLY_CAP};
use watchlist_runner::{
    analyze_series, render_report, write_reports, Analysis, Analyzer, ChatSentimentScorer,
    HeadlineProvider, PriceProvider, ProviderError, SentimentScorer, SyntheticProvider,
    TechnicalAnalysis, TemplateHeadlineProvider, WatchlistConfig, YahooChartProvider,
    YahooNewsProvider,
};

const DEFAULT_LOG_FILTER: &str = "watchlist_runner=info,watchlist=info";

#[derive(Parser)]
#[command(
    name = "watchlist",
    about = "Watchlist: technical signals and headline sentiment for a few tickers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every ticker on the watchlist and print the report.
    Watch {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured tickers (e.g., --tickers QBTS RGTI).
        #[arg(long, num_args = 1..)]
        tickers: Vec<String>,

        /// Offline mode: synthetic prices, template headlines, no sentiment calls.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Write per-ticker frame CSVs and a summary CSV to this directory.
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Replay the composite signal for one ticker.
    Backtest {
        #[arg(long)]
        ticker: String,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Show support/resistance levels for one ticker.
    Levels {
        #[arg(long)]
        ticker: String,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Shares to buy so that hitting the stop loses risk-pct of the account.
    Size {
        #[arg(long)]
        account: f64,

        /// Percent of the account to risk (1.0 = 1%).
        #[arg(long)]
        risk_pct: f64,

        #[arg(long)]
        entry: f64,

        #[arg(long)]
        stop: f64,
    },
    /// Kelly fraction, capped.
    Kelly {
        /// Fraction of winning trades (0.0 to 1.0).
        #[arg(long)]
        win_rate: f64,

        /// Average win divided by average loss.
        #[arg(long)]
        ratio: f64,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            config,
            tickers,
            offline,
            export_dir,
        } => run_watch(config, tickers, offline, export_dir),
        Commands::Backtest {
            ticker,
            config,
            offline,
        } => run_backtest_cmd(&ticker, config, offline),
        Commands::Levels {
            ticker,
            config,
            offline,
        } => run_levels_cmd(&ticker, config, offline),
        Commands::Size {
            account,
            risk_pct,
            entry,
            stop,
        } => {
            let shares = position_size(account, risk_pct, entry, stop);
            println!("Position size: {shares:.2} shares");
            if shares > 0.0 {
                println!(
                    "  risking {:.2} ({risk_pct}% of {account:.2}) over {:.4}/share",
                    account * risk_pct / 100.0,
                    (entry - stop).abs()
                );
            }
            Ok(())
        }
        Commands::Kelly { win_rate, ratio } => {
            if !(0.0..=1.0).contains(&win_rate) {
                bail!("--win-rate must be between 0 and 1, got {win_rate}");
            }
            let fraction = kelly_fraction(win_rate, ratio);
            println!("Kelly fraction: {fraction:.4} (cap {KELLY_CAP})");
            Ok(())
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<WatchlistConfig> {
    match path {
        Some(path) => WatchlistConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(WatchlistConfig::default()),
    }
}

fn price_provider(config: &WatchlistConfig, offline: bool) -> Result<Box<dyn PriceProvider>> {
    if offline {
        return Ok(Box::new(SyntheticProvider::new(Utc::now().date_naive())));
    }
    let provider = YahooChartProvider::new(config.provider.timeout())
        .context("building price provider")?;
    Ok(Box::new(provider))
}

fn headline_provider(
    config: &WatchlistConfig,
    offline: bool,
) -> Result<Box<dyn HeadlineProvider>> {
    if offline {
        return Ok(Box::new(TemplateHeadlineProvider::default()));
    }
    let provider = YahooNewsProvider::new(config.provider.timeout())
        .context("building headline provider")?;
    Ok(Box::new(provider))
}

fn sentiment_scorer(
    config: &WatchlistConfig,
    offline: bool,
) -> Result<Option<Box<dyn SentimentScorer>>> {
    if offline {
        return Ok(None);
    }
    match ChatSentimentScorer::from_config(&config.sentiment) {
        Ok(scorer) => Ok(Some(Box::new(scorer))),
        Err(ProviderError::MissingApiKey { var }) => {
            warn!(%var, "no API key; headlines will not be scored");
            Ok(None)
        }
        Err(e) => Err(e).context("building sentiment scorer"),
    }
}

fn run_watch(
    config_path: Option<PathBuf>,
    tickers: Vec<String>,
    offline: bool,
    export_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if !tickers.is_empty() {
        config.tickers = tickers;
        config.validate()?;
    }
    let tickers = config.tickers.clone();

    let analyzer = Analyzer::new(
        config.clone(),
        price_provider(&config, offline)?,
        headline_provider(&config, offline)?,
        sentiment_scorer(&config, offline)?,
    );

    info!(tickers = tickers.len(), offline, "analyzing watchlist");
    let reports = analyzer.analyze_all(&tickers);
    print!("{}", render_report(&reports));

    if let Some(dir) = export_dir {
        let written = write_reports(&dir, &reports)
            .with_context(|| format!("exporting to {}", dir.display()))?;
        println!("\nWrote {} file(s) to {}", written.len(), dir.display());
    }
    Ok(())
}

/// Fetch and analyze one ticker, failing on no data or provider errors.
fn analyze_one(ticker: &str, config: &WatchlistConfig, offline: bool) -> Result<TechnicalAnalysis> {
    let analyzer = Analyzer::new(
        config.clone(),
        price_provider(config, offline)?,
        headline_provider(config, true)?,
        None,
    );
    let series = analyzer
        .fetch_series(ticker)
        .with_context(|| format!("fetching {ticker}"))?;
    let Some(series) = series else {
        bail!("no price data for {ticker}");
    };
    match analyze_series(series, config) {
        Analysis::Ready(t) => Ok(*t),
        Analysis::NoData => bail!("no price data for {ticker}"),
        Analysis::Failed(e) => Err(e).with_context(|| format!("analyzing {ticker}")),
    }
}

fn run_backtest_cmd(ticker: &str, config_path: Option<PathBuf>, offline: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let t = analyze_one(ticker, &config, offline)?;
    let bt = &t.backtest;

    println!("=== Backtest: {ticker} ({} bars) ===", t.series.len());
    if bt.is_empty() {
        println!("Not enough bars to backtest.");
        return Ok(());
    }
    println!("Initial:        {:.2}", bt.initial_capital);
    println!("Final:          {:.2}", bt.final_equity().unwrap_or(bt.initial_capital));
    println!("Total return:   {:+.2}%", bt.total_return * 100.0);
    println!("Sharpe:         {:.3}", bt.sharpe);
    println!("Max drawdown:   {:.2}%", bt.max_drawdown * 100.0);
    println!("Final position: {:?}", bt.final_position);

    let stats = t.trade_stats;
    println!(
        "Trades:         {} (win rate {:.0}%, win/loss {:.2}, Kelly {:.2})",
        stats.trade_count,
        stats.win_rate * 100.0,
        stats.win_loss_ratio,
        t.kelly
    );
    for trade in &bt.trades {
        println!(
            "  {} @ {:.2} -> {} @ {:.2}  pnl {:+.2}",
            trade.entry_time.format("%Y-%m-%d %H:%M"),
            trade.entry_price,
            trade.exit_time.format("%Y-%m-%d %H:%M"),
            trade.exit_price,
            trade.pnl
        );
    }
    Ok(())
}

fn run_levels_cmd(ticker: &str, config_path: Option<PathBuf>, offline: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let t = analyze_one(ticker, &config, offline)?;

    let fmt = |levels: &[f64]| {
        if levels.is_empty() {
            "none".to_string()
        } else {
            levels
                .iter()
                .map(|l| format!("{l:.2}"))
                .collect::<Vec<_>>()
                .join(", ")
        }
    };

    println!(
        "=== Levels: {ticker} (window {}, cluster {:.2}%) ===",
        config.levels.window,
        config.levels.threshold * 100.0
    );
    println!("Support:    {}", fmt(&t.levels.support));
    println!("Resistance: {}", fmt(&t.levels.resistance));

    if let Some(close) = t.last_close() {
        let below = t.levels.nearest_support_below(close);
        let above = t.levels.nearest_resistance_above(close);
        println!(
            "Last close {close:.2}: support below {}, resistance above {}",
            below.map_or_else(|| "none".into(), |v| format!("{v:.2}")),
            above.map_or_else(|| "none".into(), |v| format!("{v:.2}"))
        );
    }
    Ok(())
}
