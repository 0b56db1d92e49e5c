//! Backtest pipeline
//!
//! [`PriceSeries`] -> gap scan -> position simulation -> evaluation. A run is a pure
//! function of the series and [`StrategyParams`], so independent runs (symbols or
//! parameter combinations) execute on the rayon pool.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::{
    detectors::{FairValueGapDetector, GapEvent, GapKind},
    evaluator::{evaluate, StrategyResult},
    params::StrategyParams,
    series::PriceSeries,
    simulator::{BearishSimulator, BullishSimulator, PositionSignal, PositionSimulator},
    FvgError, Result, OHLC,
};

// ============================================================
// SINGLE RUN
// ============================================================

/// One symbol's prepared series plus the parameters to run it with
#[derive(Debug, Clone)]
pub struct Backtest {
    symbol: String,
    series: PriceSeries,
    params: StrategyParams,
}

impl Backtest {
    pub fn new(symbol: impl Into<String>, series: PriceSeries, params: StrategyParams) -> Self {
        Self {
            symbol: symbol.into(),
            series,
            params,
        }
    }

    /// Prepare `rows` and build the backtest in one step
    pub fn from_rows<T: OHLC>(symbol: impl Into<String>, rows: &[T], params: StrategyParams) -> Result<Self> {
        Ok(Self::new(symbol, PriceSeries::prepare(rows)?, params))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn params(&self) -> StrategyParams {
        self.params
    }

    pub fn run_bullish(&self) -> Result<BacktestReport> {
        self.run(GapKind::Bullish)
    }

    pub fn run_bearish(&self) -> Result<BacktestReport> {
        self.run(GapKind::Bearish)
    }

    pub fn run(&self, kind: GapKind) -> Result<BacktestReport> {
        let report = run_series(&self.symbol, &self.series, kind, self.params)?;
        info!(
            symbol = %self.symbol,
            kind = %kind,
            gaps = report.events.len(),
            buy_hold_pct = report.baseline.percent_return,
            strategy_pct = report.strategy.percent_return,
            buy_hold_cagr = report.baseline.cagr,
            strategy_cagr = report.strategy.cagr,
            "backtest complete"
        );
        Ok(report)
    }
}

fn run_series(symbol: &str, series: &PriceSeries, kind: GapKind, params: StrategyParams) -> Result<BacktestReport> {
    let bars = series.bars();
    let scan = FairValueGapDetector::new(kind, params.gap_size).scan(bars);

    let simulator: Box<dyn PositionSimulator> = match kind {
        GapKind::Bullish => Box::new(BullishSimulator::new(params.holding_days)),
        GapKind::Bearish => Box::new(BearishSimulator::new(params.holding_days, params.wait_days)),
    };
    let positions = simulator.simulate(bars, &scan)?;
    let evaluation = evaluate(series, &positions)?;

    Ok(BacktestReport {
        symbol: symbol.to_string(),
        kind,
        params,
        dates: series.dates(),
        events: scan.events(bars),
        positions,
        baseline: evaluation.baseline,
        strategy: evaluation.strategy,
    })
}

// ============================================================
// REPORT
// ============================================================

/// Full output of one run: date-indexed curves plus the scalar metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub kind: GapKind,
    pub params: StrategyParams,
    pub dates: Vec<NaiveDate>,
    /// Qualifying gaps in bar order
    pub events: Vec<GapEvent>,
    pub positions: PositionSignal,
    /// Buy-and-hold
    pub baseline: StrategyResult,
    pub strategy: StrategyResult,
}

/// Scalar metrics for console or report display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub symbol: String,
    pub kind: GapKind,
    pub params: StrategyParams,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub gap_count: usize,
    pub long_days: usize,
    pub short_days: usize,
    pub buy_hold_final: f64,
    pub buy_hold_percent: f64,
    pub buy_hold_cagr: f64,
    pub strategy_final: f64,
    pub strategy_percent: f64,
    pub strategy_cagr: f64,
}

impl BacktestReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            symbol: self.symbol.clone(),
            kind: self.kind,
            params: self.params,
            start: self.dates.first().copied().unwrap_or_default(),
            end: self.dates.last().copied().unwrap_or_default(),
            gap_count: self.events.len(),
            long_days: self.positions.long_days(),
            short_days: self.positions.short_days(),
            buy_hold_final: self.baseline.final_return_factor,
            buy_hold_percent: self.baseline.percent_return,
            buy_hold_cagr: self.baseline.cagr,
            strategy_final: self.strategy.final_return_factor,
            strategy_percent: self.strategy.percent_return,
            strategy_cagr: self.strategy.cagr,
        }
    }

    /// `(date, buy_hold, strategy)` per bar
    pub fn curves(&self) -> impl Iterator<Item = (NaiveDate, f64, f64)> + '_ {
        self.dates
            .iter()
            .zip(&self.baseline.curve)
            .zip(&self.strategy.curve)
            .map(|((d, b), s)| (*d, *b, *s))
    }
}

// ============================================================
// PARALLEL RUNS
// ============================================================

/// Error from running a single instrument
#[derive(Debug, Clone, PartialEq)]
pub struct RunError {
    pub symbol: String,
    pub error: FvgError,
}

/// Run the same strategy over several instruments in parallel
pub fn run_parallel<'a, T, I>(
    instruments: I,
    kind: GapKind,
    params: StrategyParams,
) -> (Vec<BacktestReport>, Vec<RunError>)
where
    T: OHLC + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, rows)| {
            Backtest::from_rows(symbol, rows, params)
                .and_then(|bt| bt.run(kind))
                .map_err(|error| RunError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

/// One parameter combination's outcome in a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub params: StrategyParams,
    pub summary: RunSummary,
}

/// Evaluate every parameter combination over one series, in input order
pub fn sweep(symbol: &str, series: &PriceSeries, kind: GapKind, grid: &[StrategyParams]) -> Result<Vec<SweepRow>> {
    let rows = grid
        .par_iter()
        .map(|&params| {
            run_series(symbol, series, kind, params).map(|report| SweepRow {
                params,
                summary: report.summary(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    info!(symbol, kind = %kind, combinations = rows.len(), "sweep complete");
    Ok(rows)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{series::RawBar, Position};

    fn rows(closes: &[f64]) -> Vec<RawBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| RawBar::new(start + chrono::Days::new(i as u64), c, c + 1.0, c - 1.0, c))
            .collect()
    }

    fn rising() -> Vec<RawBar> {
        // Steps of 20 leave a bullish gap of 38 on every bar from the third prepared bar
        rows(&[100.0, 120.0, 140.0, 160.0, 180.0, 200.0, 220.0])
    }

    #[test]
    fn test_bullish_run_on_rising_series() {
        let params = StrategyParams::new(10.0, 2, 3).unwrap();
        let report = Backtest::from_rows("UP", &rising(), params).unwrap().run_bullish().unwrap();

        assert_eq!(report.dates.len(), 6);
        assert_eq!(report.positions.len(), 6);
        assert_eq!(report.positions.get(0), Some(Position::Flat));
        assert_eq!(report.positions.get(2), Some(Position::Long));
        assert_eq!(report.strategy.curve[0], 1.0);
        assert!(report.strategy.final_return_factor > 1.0);
        assert_eq!(report.events.len(), 4);
    }

    #[test]
    fn test_bearish_run_without_gaps_is_flat() {
        let params = StrategyParams::new(10.0, 2, 3).unwrap();
        let report = Backtest::from_rows("UP", &rising(), params).unwrap().run_bearish().unwrap();

        assert!(report.events.is_empty());
        assert!(report.positions.iter().all(Position::is_flat));
        assert!(report.strategy.curve.iter().all(|&v| v == 1.0));
        assert_eq!(report.strategy.cagr, 0.0);
    }

    #[test]
    fn test_summary_matches_report() {
        let params = StrategyParams::new(10.0, 2, 3).unwrap();
        let report = Backtest::from_rows("UP", &rising(), params).unwrap().run_bullish().unwrap();
        let summary = report.summary();

        assert_eq!(summary.gap_count, report.events.len());
        assert_eq!(summary.long_days, report.positions.long_days());
        assert_eq!(summary.strategy_final, report.strategy.final_return_factor);
        assert_eq!(summary.start, report.dates[0]);
        assert_eq!(report.curves().count(), 6);
    }

    #[test]
    fn test_run_parallel_collects_errors() {
        let good = rising();
        let short = rows(&[100.0, 101.0]);
        let instruments: Vec<(&str, &[RawBar])> = vec![("GOOD", good.as_slice()), ("SHORT", short.as_slice())];

        let (results, errors) = run_parallel(instruments, GapKind::Bullish, StrategyParams::with_holding_days(2).unwrap());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "GOOD");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "SHORT");
        assert_eq!(errors[0].error, FvgError::InsufficientData { need: 3, got: 1 });
    }

    #[test]
    fn test_sweep_preserves_grid_order() {
        let series = PriceSeries::prepare(&rising()).unwrap();
        let grid = vec![
            StrategyParams::new(5.0, 2, 3).unwrap(),
            StrategyParams::new(50.0, 2, 3).unwrap(),
        ];
        let rows = sweep("UP", &series, GapKind::Bullish, &grid).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].params, grid[0]);
        assert!(rows[0].summary.gap_count > 0);
        assert_eq!(rows[1].summary.gap_count, 0);
        assert_eq!(rows[1].summary.strategy_final, 1.0);
    }
}
