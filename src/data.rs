//! CSV input for daily OHLC tables
//!
//! Expects a header row with `Date`, `Open`, `High`, `Low` and `Close` columns (any case,
//! any order; extra columns such as `Adj Close` or `Volume` are ignored). Dates are
//! `YYYY-MM-DD`, optionally followed by a time component which is dropped.

use std::{fs::File, io::Read, path::Path};

use chrono::NaiveDate;
use tracing::info;

use crate::{series::RawBar, FvgError, Result};

const COLUMNS: [&str; 5] = ["date", "open", "high", "low", "close"];

/// Read rows with `start <= date < end`; `None` keeps every row
pub fn read_csv<R: Read>(reader: R, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<RawBar>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut index = [0usize; 5];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| FvgError::Csv(format!("missing '{name}' column")))?;
    }

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let field = |i: usize| record.get(index[i]).unwrap_or("");
        let date = parse_date(field(0)).map_err(|e| FvgError::Csv(format!("row {}: {e}", line + 1)))?;

        if let Some((start, end)) = range {
            if date < start || date >= end {
                continue;
            }
        }

        let mut prices = [0.0f64; 4];
        for (k, price) in prices.iter_mut().enumerate() {
            let raw = field(k + 1);
            *price = raw.parse().map_err(|_| {
                FvgError::Csv(format!("row {}: invalid {} value '{raw}'", line + 1, COLUMNS[k + 1]))
            })?;
        }
        let [open, high, low, close] = prices;
        rows.push(RawBar::new(date, open, high, low, close));
    }

    Ok(rows)
}

/// Load a CSV file, see [`read_csv`]
pub fn load_csv(path: impl AsRef<Path>, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<RawBar>> {
    let path = path.as_ref();
    let rows = read_csv(File::open(path)?, range)?;
    info!(path = %path.display(), rows = rows.len(), "loaded price table");
    Ok(rows)
}

/// Keep rows with `start <= date < end`
pub fn select_range(rows: &[RawBar], start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
    rows.iter().filter(|r| r.date >= start && r.date < end).copied().collect()
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}
