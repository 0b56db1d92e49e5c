//! Performance evaluation - pure functions over log-returns and positions.
//!
//! Positions apply with a one-bar lag: the position decided at the close of bar `t - 1`
//! earns the return realized on bar `t`. Bar 0 has no prior position and is uninvested.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{series::PriceSeries, simulator::PositionSignal, FvgError, Position, Result};

/// Days per year used for the CAGR horizon
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Growth curve plus its summary scalars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyResult {
    /// 1.0-based growth factor per bar
    pub curve: Vec<f64>,
    pub final_return_factor: f64,
    /// (final_return_factor - 1) * 100
    pub percent_return: f64,
    /// final_return_factor^(1 / years) - 1
    pub cagr: f64,
    pub years: f64,
}

impl StrategyResult {
    /// Summarize a growth curve spanning `first..=last`
    pub fn from_curve(curve: Vec<f64>, first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let Some(&final_return_factor) = curve.last() else {
            return Err(FvgError::InsufficientData { need: 1, got: 0 });
        };
        let years = years_between(first, last)?;

        Ok(Self {
            percent_return: percent_return(final_return_factor),
            cagr: cagr(final_return_factor, years)?,
            final_return_factor,
            years,
            curve,
        })
    }
}

/// Strategy and buy-and-hold evaluated over the same bars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub baseline: StrategyResult,
    pub strategy: StrategyResult,
}

/// Evaluate `signal` against the buy-and-hold baseline of `series`
pub fn evaluate(series: &PriceSeries, signal: &PositionSignal) -> Result<Evaluation> {
    let (first, last) = (series.first_date(), series.last_date());
    let strategy_curve = cumulative_returns(&series.log_returns(), signal.positions())?;

    Ok(Evaluation {
        baseline: StrategyResult::from_curve(series.buy_hold_curve(), first, last)?,
        strategy: StrategyResult::from_curve(strategy_curve, first, last)?,
    })
}

/// `exp(cumsum(log_return[t] * position[t - 1]))`, with bar 0 contributing zero
pub fn cumulative_returns(log_returns: &[f64], positions: &[Position]) -> Result<Vec<f64>> {
    if positions.len() != log_returns.len() {
        return Err(FvgError::LengthMismatch {
            what: "position signal",
            expected: log_returns.len(),
            got: positions.len(),
        });
    }

    let lagged = std::iter::once(0.0).chain(positions.iter().map(|p| p.as_f64()));
    let mut total = 0.0;
    Ok(log_returns
        .iter()
        .zip(lagged)
        .map(|(r, exposure)| {
            total += r * exposure;
            total.exp()
        })
        .collect())
}

/// Elapsed calendar time in years; errors when the span is under one day
pub fn years_between(first: NaiveDate, last: NaiveDate) -> Result<f64> {
    let days = (last - first).num_days();
    if days <= 0 {
        return Err(FvgError::InsufficientHistory { days });
    }
    Ok(days as f64 / DAYS_PER_YEAR)
}

#[inline]
pub fn percent_return(final_return_factor: f64) -> f64 {
    (final_return_factor - 1.0) * 100.0
}

/// Compound annual growth rate
pub fn cagr(final_return_factor: f64, years: f64) -> Result<f64> {
    if years <= 0.0 || !years.is_finite() {
        return Err(FvgError::InsufficientHistory { days: (years * DAYS_PER_YEAR) as i64 });
    }
    Ok(final_return_factor.powf(1.0 / years) - 1.0)
}

// ============================================================
// TESTS
// ============================================================
