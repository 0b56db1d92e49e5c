//! Price series preparation
//!
//! Turns a raw daily OHLC table into a chronologically ordered [`Bar`] sequence with
//! daily log-returns and the buy-and-hold growth factor. The first raw row only seeds
//! the first return and is dropped.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{FvgError, Result, OHLC};

/// Raw daily row as delivered by a market-data source
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl RawBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }
}

impl OHLC for RawBar {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// One prepared trading day
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// ln(close / previous close)
    pub log_return: f64,
    /// exp of the running sum of `log_return`, 1.0-based
    pub buy_hold: f64,
}

impl OHLC for Bar {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// Cleaned, gap-free daily series. Always holds at least [`PriceSeries::MIN_BARS`] bars.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Gap detection looks back two bars
    pub const MIN_BARS: usize = 3;

    /// Validate, order and derive returns for a raw OHLC table.
    ///
    /// Rows out of date order are sorted; duplicate dates and non-positive or
    /// non-finite prices are rejected.
    pub fn prepare<T: OHLC>(rows: &[T]) -> Result<Self> {
        let mut raw = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            row.validate().map_err(|e| match e {
                FvgError::InvalidBar { reason, .. } => FvgError::InvalidBar { index, reason },
                other => other,
            })?;
            raw.push(RawBar::new(row.date(), row.open(), row.high(), row.low(), row.close()));
        }

        if !raw.windows(2).all(|w| w[0].date <= w[1].date) {
            warn!(rows = raw.len(), "price rows out of date order, sorting");
            raw.sort_by_key(|r| r.date);
        }
        if let Some(w) = raw.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(FvgError::DuplicateDate(w[1].date));
        }

        let mut cumulative = 0.0;
        let bars: Vec<Bar> = raw
            .windows(2)
            .map(|w| {
                let (prev, cur) = (&w[0], &w[1]);
                let log_return = (cur.close / prev.close).ln();
                cumulative += log_return;
                Bar {
                    date: cur.date,
                    open: cur.open,
                    high: cur.high,
                    low: cur.low,
                    close: cur.close,
                    log_return,
                    buy_hold: cumulative.exp(),
                }
            })
            .collect();

        if bars.len() < Self::MIN_BARS {
            return Err(FvgError::InsufficientData {
                need: Self::MIN_BARS,
                got: bars.len(),
            });
        }

        debug!(
            bars = bars.len(),
            first = %bars[0].date,
            last = %bars[bars.len() - 1].date,
            "prepared price series"
        );
        Ok(Self { bars })
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn log_returns(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.log_return).collect()
    }

    /// Buy-and-hold growth factor per bar
    pub fn buy_hold_curve(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.buy_hold).collect()
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn row(d: u32, close: f64) -> RawBar {
        RawBar::new(day(d), close, close + 1.0, close - 1.0, close)
    }

    #[test]
    fn test_prepare_drops_first_row() {
        let rows = vec![row(1, 100.0), row(2, 110.0), row(3, 121.0), row(4, 110.0)];
        let series = PriceSeries::prepare(&rows).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), day(2));
        assert_eq!(series.last_date(), day(4));
        assert!((series.bars()[0].log_return - (1.1f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_buy_hold_tracks_close_ratio() {
        let rows = vec![row(1, 100.0), row(2, 110.0), row(3, 121.0), row(4, 110.0)];
        let series = PriceSeries::prepare(&rows).unwrap();

        let curve = series.buy_hold_curve();
        assert!((curve[0] - 1.10).abs() < 1e-12);
        assert!((curve[1] - 1.21).abs() < 1e-12);
        assert!((curve[2] - 1.10).abs() < 1e-12);
    }

    #[test]
    fn test_unordered_rows_are_sorted() {
        let rows = vec![row(3, 121.0), row(1, 100.0), row(4, 110.0), row(2, 110.0)];
        let series = PriceSeries::prepare(&rows).unwrap();
        assert_eq!(series.dates(), vec![day(2), day(3), day(4)]);
    }

    #[test]
    fn test_duplicate_date_rejected() {
        let rows = vec![row(1, 100.0), row(2, 110.0), row(2, 111.0), row(3, 121.0)];
        assert_eq!(PriceSeries::prepare(&rows).unwrap_err(), FvgError::DuplicateDate(day(2)));
    }

    #[test]
    fn test_insufficient_history() {
        let rows = vec![row(1, 100.0), row(2, 110.0), row(3, 121.0)];
        assert_eq!(
            PriceSeries::prepare(&rows).unwrap_err(),
            FvgError::InsufficientData { need: 3, got: 2 }
        );

        let empty: Vec<RawBar> = vec![];
        assert!(PriceSeries::prepare(&empty).is_err());
    }

    #[test]
    fn test_invalid_price_reports_row_index() {
        let mut rows = vec![row(1, 100.0), row(2, 110.0), row(3, 121.0), row(4, 110.0)];
        rows[2].close = -5.0;
        assert_eq!(
            PriceSeries::prepare(&rows).unwrap_err(),
            FvgError::InvalidBar { index: 2, reason: "non-positive price" }
        );

        rows[2].close = f64::INFINITY;
        assert!(matches!(
            PriceSeries::prepare(&rows),
            Err(FvgError::InvalidBar { index: 2, .. })
        ));
    }
}
