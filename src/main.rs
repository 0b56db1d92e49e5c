//! fairgap CLI - run the bullish or bearish fair value gap strategy on a CSV price table.
//!
//! Commands:
//! - `bullish` - long on each qualifying bullish gap for `--holding-days`
//! - `bearish` - short after a bearish gap retraces within `--wait-days`
//! - `sweep` - evaluate a grid of parameters and rank by strategy return

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate};
use clap::{Args, Parser, Subcommand};
use fairgap::prelude::*;
use fairgap::{
    data::{load_csv, select_range},
    export,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "fairgap", about = "Fair value gap strategy backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// CSV with Date, Open, High, Low, Close columns.
    #[arg(long)]
    csv: PathBuf,

    /// TOML config file; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker label. Defaults to the CSV file stem.
    #[arg(long)]
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD), inclusive. Defaults to the first row.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), exclusive. Defaults to the day after the last row.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Minimum gap in price units.
    #[arg(long)]
    gap_size: Option<f64>,

    /// Bars to hold each position.
    #[arg(long)]
    holding_days: Option<usize>,

    /// Bars to wait for a bearish retracement.
    #[arg(long)]
    wait_days: Option<usize>,

    /// Write date,buy_hold,strategy,position rows to this CSV.
    #[arg(long)]
    curves: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Long on each qualifying bullish gap.
    Bullish(RunArgs),
    /// Short after a bearish gap retraces into its range.
    Bearish(RunArgs),
    /// Evaluate every combination of the given parameter lists.
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// bullish or bearish.
        #[arg(long, default_value = "bullish")]
        side: GapKind,

        /// Gap sizes, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![5.0, 10.0, 15.0, 20.0])]
        gap_sizes: Vec<f64>,

        /// Holding periods, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![1, 3, 5, 10])]
        holding_days: Vec<usize>,

        /// Wait windows, comma separated.
        #[arg(long, value_delimiter = ',', default_values_t = vec![3])]
        wait_days: Vec<usize>,

        /// Rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fairgap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bullish(args) => run_single(GapKind::Bullish, args),
        Commands::Bearish(args) => run_single(GapKind::Bearish, args),
        Commands::Sweep {
            data,
            side,
            gap_sizes,
            holding_days,
            wait_days,
            top,
        } => run_sweep(data, side, gap_sizes, holding_days, wait_days, top),
    }
}

/// Config file values, overridden by flags, with the data's own range as fallback
fn resolve_config(
    data: &DataArgs,
    rows: &[RawBar],
    gap_size: Option<f64>,
    holding_days: Option<usize>,
    wait_days: Option<usize>,
) -> Result<BacktestConfig> {
    let config = data
        .config
        .as_ref()
        .map(|path| BacktestConfig::from_file(path).with_context(|| format!("reading config {}", path.display())))
        .transpose()?;

    let (Some(first), Some(last)) = (rows.iter().map(|r| r.date).min(), rows.iter().map(|r| r.date).max()) else {
        bail!("{} has no rows", data.csv.display());
    };

    let ticker = data
        .ticker
        .clone()
        .or_else(|| config.as_ref().map(|c| c.ticker.clone()))
        .or_else(|| data.csv.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "UNKNOWN".to_string());
    let start = data.start.or(config.as_ref().map(|c| c.start)).unwrap_or(first);
    let end = data
        .end
        .or(config.as_ref().map(|c| c.end))
        .unwrap_or_else(|| last + Days::new(1));
    let holding = holding_days.or(config.as_ref().map(|c| c.holding_days.get()));

    let Some(holding) = holding else {
        bail!("--holding-days is required when no config file provides it");
    };

    let mut resolved = BacktestConfig::new(ticker, start, end, holding)?;
    if let Some(c) = &config {
        resolved.gap_size = c.gap_size;
        resolved.wait_days = c.wait_days;
    }
    if let Some(g) = gap_size {
        resolved = resolved.with_gap_size(g)?;
    }
    if let Some(w) = wait_days {
        resolved = resolved.with_wait_days(w)?;
    }
    Ok(resolved)
}

fn read_rows(data: &DataArgs) -> Result<Vec<RawBar>> {
    load_csv(&data.csv, None).with_context(|| format!("reading {}", data.csv.display()))
}

fn load_series(rows: &[RawBar], config: &BacktestConfig) -> Result<PriceSeries> {
    let rows = select_range(rows, config.start, config.end);
    PriceSeries::prepare(&rows).with_context(|| format!("preparing {} {}..{}", config.ticker, config.start, config.end))
}

fn run_single(kind: GapKind, args: RunArgs) -> Result<()> {
    let rows = read_rows(&args.data)?;
    let config = resolve_config(&args.data, &rows, args.gap_size, args.holding_days, args.wait_days)?;
    info!(ticker = %config.ticker, kind = %kind, start = %config.start, end = %config.end, "running backtest");

    let series = load_series(&rows, &config)?;
    let report = Backtest::new(config.ticker.clone(), series, config.params()).run(kind)?;

    if let Some(path) = &args.curves {
        export::save_curves(path, &report).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote curves");
    }

    let summary = report.summary();
    if args.data.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} | {} | gap size = {}", summary.symbol, summary.kind, summary.params.gap_size.get());
    println!("{} .. {}", summary.start, summary.end);
    for event in report.events.iter().take(5) {
        println!("  gap {} size {:.2} range [{:.2}, {:.2}]", event.date, event.gap_size, event.lower_bound, event.upper_bound);
    }
    if report.events.len() > 5 {
        println!("  ... {} more", report.events.len() - 5);
    }
    println!();
    println!("{:<24}{:>14}{:>14}", "", "Buy and Hold", "Strategy");
    println!("{:<24}{:>14.4}{:>14.4}", "Final return", summary.buy_hold_final, summary.strategy_final);
    println!("{:<24}{:>13.2}%{:>13.2}%", "Percent return", summary.buy_hold_percent, summary.strategy_percent);
    println!("{:<24}{:>13.2}%{:>13.2}%", "CAGR", summary.buy_hold_cagr * 100.0, summary.strategy_cagr * 100.0);
    println!("{:<24}{:>14}{:>14}", "Days long / short", "", format!("{} / {}", summary.long_days, summary.short_days));
    Ok(())
}

fn run_sweep(
    data: DataArgs,
    side: GapKind,
    gap_sizes: Vec<f64>,
    holding_days: Vec<usize>,
    wait_days: Vec<usize>,
    top: usize,
) -> Result<()> {
    let first_holding = holding_days.first().copied();
    let rows = read_rows(&data)?;
    let config = resolve_config(&data, &rows, None, first_holding, None)?;
    let series = load_series(&rows, &config)?;

    let grid = SweepGrid::new(gap_sizes, holding_days, wait_days)?;
    let mut rows = sweep(&config.ticker, &series, side, &grid.combinations())?;
    rows.sort_by(|a, b| b.summary.strategy_percent.total_cmp(&a.summary.strategy_percent));

    if data.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} | {} sweep | {} combinations", config.ticker, side, rows.len());
    println!("{:>10}{:>10}{:>10}{:>8}{:>12}{:>12}", "gap", "hold", "wait", "gaps", "return %", "CAGR %");
    for row in rows.iter().take(top) {
        let p = row.params;
        println!(
            "{:>10.2}{:>10}{:>10}{:>8}{:>12.2}{:>12.2}",
            p.gap_size.get(),
            p.holding_days.get(),
            p.wait_days.get(),
            row.summary.gap_count,
            row.summary.strategy_percent,
            row.summary.strategy_cagr * 100.0
        );
    }
    if let Some(best) = rows.first() {
        println!("buy and hold: {:.2}%", best.summary.buy_hold_percent);
    }
    Ok(())
}
