//! # fairgap - Fair Value Gap backtesting
//!
//! Detects fair value gaps (three-bar price imbalances) in a daily OHLC series and
//! simulates the bullish and bearish gap strategies against a buy-and-hold baseline.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fairgap::prelude::*;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let rows: Vec<RawBar> = (0..30)
//!     .map(|i| {
//!         let base = 100.0 + i as f64;
//!         RawBar::new(start + chrono::Days::new(i), base, base + 1.0, base - 1.0, base + 0.5)
//!     })
//!     .collect();
//!
//! let series = PriceSeries::prepare(&rows).unwrap();
//! let params = StrategyParams::new(10.0, 5, 3).unwrap();
//! let report = Backtest::new("DEMO", series, params).run(GapKind::Bullish).unwrap();
//!
//! println!("{:.2}%", report.strategy.percent_return);
//! ```
//!
//! ## Pipeline
//!
//! [`series::PriceSeries`] -> [`detectors::GapScan`] -> [`simulator::PositionSignal`] ->
//! [`evaluator::StrategyResult`]. Each stage returns a new value and never mutates the
//! output of an earlier one.

pub mod backtest;
pub mod config;
pub mod data;
pub mod detectors;
pub mod evaluator;
pub mod export;
pub mod params;
pub mod series;
pub mod simulator;

pub mod prelude {
    pub use crate::{
        // Pipeline
        backtest::{run_parallel, sweep, Backtest, BacktestReport, RunError, RunSummary, SweepRow},
        config::BacktestConfig,
        // Detectors
        detectors::{scan_bearish, scan_bullish, FairValueGapDetector, GapEntry, GapEvent, GapKind, GapScan},
        evaluator::{cagr, cumulative_returns, years_between, Evaluation, StrategyResult},
        // Parameters
        params::{ParamMeta, ParamType, StrategyParams, SweepGrid},
        series::{Bar, PriceSeries, RawBar},
        simulator::{BearishSimulator, BearishState, BullishSimulator, PositionSignal, PositionSimulator},
        // Errors
        ErrorKind,
        FvgError,
        // Types
        GapThreshold,
        Period,
        Position,
        Result,
        OHLC,
    };
}

use chrono::NaiveDate;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, FvgError>;

/// Errors raised by the backtesting pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FvgError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Duplicate bar date {0}")]
    DuplicateDate(NaiveDate),

    #[error("Length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Insufficient history: series spans {days} day(s), CAGR needs at least one")]
    InsufficientHistory { days: i64 },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Coarse classification of [`FvgError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or insufficient price history
    Data,
    /// Non-positive threshold/holding/wait parameters or inconsistent settings
    Config,
    /// Date span too short for CAGR
    InsufficientHistory,
}

impl FvgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FvgError::InvalidValue(_) | FvgError::InvalidConfig(_) => ErrorKind::Config,
            FvgError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            FvgError::InsufficientData { .. }
            | FvgError::InvalidBar { .. }
            | FvgError::DuplicateDate(_)
            | FvgError::LengthMismatch { .. }
            | FvgError::Csv(_)
            | FvgError::Io(_) => ErrorKind::Data,
        }
    }
}

impl From<csv::Error> for FvgError {
    fn from(e: csv::Error) -> Self {
        FvgError::Csv(e.to_string())
    }
}

impl From<std::io::Error> for FvgError {
    fn from(e: std::io::Error) -> Self {
        FvgError::Io(e.to_string())
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Minimum gap size in price units (finite, > 0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct GapThreshold(f64);

impl GapThreshold {
    pub const DEFAULT: GapThreshold = GapThreshold(10.0);

    /// Create a new threshold, validating the value is finite and strictly positive
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(FvgError::InvalidValue(
                "Gap threshold cannot be NaN or infinite",
            ));
        }
        if value <= 0.0 {
            return Err(FvgError::InvalidValue("Gap threshold must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for GapThreshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl serde::Serialize for GapThreshold {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for GapThreshold {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        GapThreshold::new(value).map_err(serde::de::Error::custom)
    }
}

/// Day count (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Default retracement window for the bearish strategy
    pub const DEFAULT_WAIT: Period = Period(3);

    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(FvgError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAIT
// ============================================================

/// Daily OHLC row keyed by calendar date
pub trait OHLC {
    fn date(&self) -> NaiveDate;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    /// Validate that every price is finite, strictly positive and high >= low
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(FvgError::InvalidBar {
                index: 0,
                reason: "non-finite price",
            });
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(FvgError::InvalidBar {
                index: 0,
                reason: "non-positive price",
            });
        }
        if self.high() < self.low() {
            return Err(FvgError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: OHLC> OHLC for &T {
    fn date(&self) -> NaiveDate {
        (*self).date()
    }

    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }
}

// ============================================================
// POSITION
// ============================================================

/// Exposure held at the close of a bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Position {
    Long,
    Short,
    #[default]
    Flat,
}

impl Position {
    /// Signed exposure: +1 long, -1 short, 0 flat
    #[inline]
    pub fn value(self) -> i8 {
        match self {
            Position::Long => 1,
            Position::Short => -1,
            Position::Flat => 0,
        }
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    #[inline]
    pub fn is_flat(self) -> bool {
        matches!(self, Position::Flat)
    }
}

// ============================================================
// TESTS
// ============================================================
