//! CSV export of the date-indexed growth curves for external charting tools.

use std::{io::Write, path::Path};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{backtest::BacktestReport, FvgError, Result};

#[derive(Serialize)]
struct CurveRow {
    date: NaiveDate,
    buy_hold: f64,
    strategy: f64,
    position: i8,
}

/// Write `date,buy_hold,strategy,position` rows
pub fn write_curves<W: Write>(writer: W, report: &BacktestReport) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for ((date, buy_hold, strategy), position) in report.curves().zip(report.positions.iter()) {
        wtr.serialize(CurveRow {
            date,
            buy_hold,
            strategy,
            position: position.value(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Curves as a CSV string
pub fn curves_csv(report: &BacktestReport) -> Result<String> {
    let mut buf = Vec::new();
    write_curves(&mut buf, report)?;
    String::from_utf8(buf).map_err(|e| FvgError::Csv(e.to_string()))
}

pub fn save_curves(path: impl AsRef<Path>, report: &BacktestReport) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_curves(file, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backtest::Backtest, params::StrategyParams, series::RawBar};

    fn report() -> BacktestReport {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let rows: Vec<RawBar> = [100.0, 120.0, 140.0, 160.0, 180.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| RawBar::new(start + chrono::Days::new(i as u64), c, c + 1.0, c - 1.0, c))
            .collect();
        Backtest::from_rows("UP", &rows, StrategyParams::with_holding_days(2).unwrap())
            .unwrap()
            .run_bullish()
            .unwrap()
    }

    #[test]
    fn test_curves_csv_layout() {
        let report = report();
        let csv = curves_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "date,buy_hold,strategy,position");
        assert_eq!(lines.len(), report.dates.len() + 1);
        assert!(lines[1].starts_with("2023-01-03,"));
        assert!(lines[1].ends_with(",1.0,0"));
    }

    #[test]
    fn test_save_curves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.csv");
        save_curves(&path, &report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date,buy_hold,strategy,position\n"));
    }
}
