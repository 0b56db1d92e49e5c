//! Strategy parameters and sweep grids
//!
//! This module provides metadata about the gap strategy parameters, enabling:
//! - Grid search over threshold / holding / wait combinations
//! - Parameter documentation for the CLI
//!
//! # Example
//!
//! ```rust
//! use fairgap::params::{StrategyParams, SweepGrid};
//!
//! for param in StrategyParams::param_meta() {
//!   println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let grid = SweepGrid::new(vec![5.0, 10.0], vec![2, 5], vec![3]).unwrap();
//! assert_eq!(grid.combinations().len(), 4);
//! ```

use std::collections::HashMap;

use crate::{FvgError, GapThreshold, Period, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Price distance (finite, > 0)
  Threshold,
  /// Day count (positive integer)
  Period,
}

/// Metadata for a single strategy parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "holding_days")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn threshold(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Threshold, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    if step <= 0.0 {
      return vec![min];
    }
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    match self.param_type {
      ParamType::Threshold => GapThreshold::new(value).map(|_| ()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(FvgError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
    }
  }
}

const PARAMS: &[ParamMeta] = &[
  ParamMeta::threshold("gap_size", 10.0, (2.0, 30.0, 2.0), "Minimum gap in price units"),
  ParamMeta::period("holding_days", 5.0, (1.0, 20.0, 1.0), "Bars to hold each position"),
  ParamMeta::period("wait_days", 3.0, (1.0, 10.0, 1.0), "Bars to wait for a bearish retracement"),
];

// ============================================================
// STRATEGY PARAMETERS
// ============================================================

/// Validated parameter set for one backtest run
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrategyParams {
  #[serde(default)]
  pub gap_size: GapThreshold,
  pub holding_days: Period,
  /// Only used by the bearish strategy
  #[serde(default = "default_wait_days")]
  pub wait_days: Period,
}

fn default_wait_days() -> Period {
  Period::DEFAULT_WAIT
}

impl StrategyParams {
  pub fn new(gap_size: f64, holding_days: usize, wait_days: usize) -> Result<Self> {
    Ok(Self {
      gap_size: GapThreshold::new(gap_size)?,
      holding_days: Period::new(holding_days)?,
      wait_days: Period::new(wait_days)?,
    })
  }

  /// Default threshold and wait window with the given holding period
  pub fn with_holding_days(holding_days: usize) -> Result<Self> {
    Ok(Self {
      gap_size: GapThreshold::DEFAULT,
      holding_days: Period::new(holding_days)?,
      wait_days: Period::DEFAULT_WAIT,
    })
  }

  /// Returns metadata for all configurable parameters
  pub fn param_meta() -> &'static [ParamMeta] {
    PARAMS
  }

  /// Creates parameters from a HashMap. Missing keys use their defaults.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    for meta in PARAMS {
      if let Some(&value) = params.get(meta.name) {
        meta.validate(value)?;
      }
    }
    Ok(Self {
      gap_size: get_threshold(params, "gap_size", GapThreshold::DEFAULT.get())?,
      holding_days: get_period(params, "holding_days", 5)?,
      wait_days: get_period(params, "wait_days", Period::DEFAULT_WAIT.get())?,
    })
  }
}

// ============================================================
// SWEEP GRID
// ============================================================

/// Cartesian grid of strategy parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
  pub gap_sizes: Vec<GapThreshold>,
  pub holding_days: Vec<Period>,
  pub wait_days: Vec<Period>,
}

impl SweepGrid {
  pub fn new(gap_sizes: Vec<f64>, holding_days: Vec<usize>, wait_days: Vec<usize>) -> Result<Self> {
    if gap_sizes.is_empty() || holding_days.is_empty() || wait_days.is_empty() {
      return Err(FvgError::InvalidConfig("sweep grid axes must not be empty".into()));
    }
    Ok(Self {
      gap_sizes: gap_sizes.into_iter().map(GapThreshold::new).collect::<Result<_>>()?,
      holding_days: holding_days.into_iter().map(Period::new).collect::<Result<_>>()?,
      wait_days: wait_days.into_iter().map(Period::new).collect::<Result<_>>()?,
    })
  }

  /// Grid spanning each parameter's default optimization range
  pub fn from_meta() -> Self {
    let axis = |name: &str| {
      PARAMS.iter().find(|m| m.name == name).map(ParamMeta::generate_grid).unwrap_or_default()
    };
    Self {
      gap_sizes: axis("gap_size").into_iter().map(GapThreshold::new_const).collect(),
      holding_days: axis("holding_days").into_iter().map(|v| Period::new_const(v as usize)).collect(),
      wait_days: axis("wait_days").into_iter().map(|v| Period::new_const(v as usize)).collect(),
    }
  }

  pub fn combinations(&self) -> Vec<StrategyParams> {
    let mut out = Vec::with_capacity(self.gap_sizes.len() * self.holding_days.len() * self.wait_days.len());
    for &gap_size in &self.gap_sizes {
      for &holding_days in &self.holding_days {
        for &wait_days in &self.wait_days {
          out.push(StrategyParams { gap_size, holding_days, wait_days });
        }
      }
    }
    out
  }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a GapThreshold from params with default fallback
pub fn get_threshold(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<GapThreshold> {
  let value = params.get(key).copied().unwrap_or(default);
  GapThreshold::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  Period::new(value as usize)
}

// ============================================================
// TESTS
// ============================================================
