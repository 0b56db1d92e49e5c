//! Backtest configuration
//!
//! A run is fully described by a ticker, a half-open date range `[start, end)` and the
//! strategy parameters. Configs load from TOML:
//!
//! ```toml
//! ticker = "SPY"
//! start = "2015-01-01"
//! end = "2024-01-01"
//! gap_size = 10.0
//! holding_days = 5
//! wait_days = 3
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{params::StrategyParams, FvgError, GapThreshold, Period, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub ticker: String,
    pub start: NaiveDate,
    /// Exclusive
    pub end: NaiveDate,
    #[serde(default)]
    pub gap_size: GapThreshold,
    pub holding_days: Period,
    #[serde(default = "default_wait_days")]
    pub wait_days: Period,
}

fn default_wait_days() -> Period {
    Period::DEFAULT_WAIT
}

impl BacktestConfig {
    pub fn new(
        ticker: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        holding_days: usize,
    ) -> Result<Self> {
        let config = Self {
            ticker: ticker.into(),
            start,
            end,
            gap_size: GapThreshold::DEFAULT,
            holding_days: Period::new(holding_days)?,
            wait_days: Period::DEFAULT_WAIT,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_gap_size(mut self, gap_size: f64) -> Result<Self> {
        self.gap_size = GapThreshold::new(gap_size)?;
        Ok(self)
    }

    pub fn with_holding_days(mut self, holding_days: usize) -> Result<Self> {
        self.holding_days = Period::new(holding_days)?;
        Ok(self)
    }

    pub fn with_wait_days(mut self, wait_days: usize) -> Result<Self> {
        self.wait_days = Period::new(wait_days)?;
        Ok(self)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| FvgError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| FvgError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(FvgError::InvalidConfig("ticker must not be empty".into()));
        }
        if self.start >= self.end {
            return Err(FvgError::InvalidConfig(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn params(&self) -> StrategyParams {
        StrategyParams {
            gap_size: self.gap_size,
            holding_days: self.holding_days,
            wait_days: self.wait_days,
        }
    }
}
