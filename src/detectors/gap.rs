//! Bullish and bearish gap scans

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, Level};

use crate::{series::Bar, GapThreshold, OHLC};

// ============================================================
// TYPES
// ============================================================

/// Direction of the imbalance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GapKind {
  Bullish,
  Bearish,
}

impl GapKind {
  pub fn as_str(self) -> &'static str {
    match self {
      GapKind::Bullish => "bullish",
      GapKind::Bearish => "bearish",
    }
  }
}

impl std::fmt::Display for GapKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for GapKind {
  type Err = crate::FvgError;

  fn from_str(s: &str) -> crate::Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "bullish" | "bull" | "long" => Ok(GapKind::Bullish),
      "bearish" | "bear" | "short" => Ok(GapKind::Bearish),
      _ => Err(crate::FvgError::InvalidConfig(format!("unknown gap kind '{s}'"))),
    }
  }
}

/// Scan output for a single bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GapEntry {
  /// Signed gap size, `None` for the first two bars
  pub gap: Option<f64>,
  pub qualifies: bool,
  /// Opposite extreme of the bar two periods earlier: high for bullish, low for bearish
  pub candle1: Option<f64>,
}

/// A qualifying imbalance anchored at `bar_index`
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct GapEvent {
  pub kind: GapKind,
  pub bar_index: usize,
  pub date: NaiveDate,
  pub gap_size: f64,
  /// Bottom of the vacated range
  pub lower_bound: f64,
  /// Top of the vacated range
  pub upper_bound: f64,
}

// ============================================================
// DETECTOR
// ============================================================

/// Three-bar fair value gap detector
#[derive(Debug, Clone, Copy)]
pub struct FairValueGapDetector {
  pub kind: GapKind,
  pub threshold: GapThreshold,
}

impl FairValueGapDetector {
  pub fn new(kind: GapKind, threshold: GapThreshold) -> Self {
    Self { kind, threshold }
  }

  pub fn bullish(threshold: GapThreshold) -> Self {
    Self::new(GapKind::Bullish, threshold)
  }

  pub fn bearish(threshold: GapThreshold) -> Self {
    Self::new(GapKind::Bearish, threshold)
  }

  /// Evaluate the gap at `index`. Depends only on bars `index` and `index - 2`.
  #[inline]
  pub fn entry_at<T: OHLC>(&self, bars: &[T], index: usize) -> GapEntry {
    if index < 2 {
      return GapEntry::default();
    }
    let (Some(first), Some(third)) = (bars.get(index - 2), bars.get(index)) else {
      return GapEntry::default();
    };

    let (gap, candle1) = match self.kind {
      GapKind::Bullish => (third.low() - first.high(), first.high()),
      GapKind::Bearish => (first.low() - third.high(), first.low()),
    };

    GapEntry {
      gap: Some(gap),
      qualifies: gap >= self.threshold.get(),
      candle1: Some(candle1),
    }
  }

  /// Detect a qualifying gap at `index`
  pub fn detect<T: OHLC>(&self, bars: &[T], index: usize) -> Option<GapEvent> {
    let entry = self.entry_at(bars, index);
    if !entry.qualifies {
      return None;
    }
    let third = bars.get(index)?;
    let gap_size = entry.gap?;
    let candle1 = entry.candle1?;

    let (lower_bound, upper_bound) = match self.kind {
      GapKind::Bullish => (candle1, third.low()),
      GapKind::Bearish => (third.high(), candle1),
    };

    Some(GapEvent {
      kind: self.kind,
      bar_index: index,
      date: third.date(),
      gap_size,
      lower_bound,
      upper_bound,
    })
  }

  /// Scan every bar left to right
  pub fn scan(&self, bars: &[Bar]) -> GapScan {
    let entries = (0..bars.len()).map(|i| self.entry_at(bars, i)).collect();
    self.finish(bars, entries)
  }

  /// Same as [`scan`](Self::scan), computed on the rayon pool
  pub fn scan_par(&self, bars: &[Bar]) -> GapScan {
    let entries = (0..bars.len()).into_par_iter().map(|i| self.entry_at(bars, i)).collect();
    self.finish(bars, entries)
  }

  fn finish(&self, bars: &[Bar], entries: Vec<GapEntry>) -> GapScan {
    let scan = GapScan {
      kind: self.kind,
      threshold: self.threshold,
      entries,
    };
    if tracing::enabled!(Level::DEBUG) {
      for event in scan.events(bars) {
        debug!(
          kind = %event.kind,
          date = %event.date,
          gap = event.gap_size,
          "fair value gap"
        );
      }
    }
    debug!(kind = %self.kind, found = scan.count(), bars = bars.len(), "gap scan complete");
    scan
  }
}

// ============================================================
// SCAN RESULT
// ============================================================

/// Per-bar gap values and qualification flags, indexed like the price series
#[derive(Debug, Clone, PartialEq)]
pub struct GapScan {
  pub kind: GapKind,
  pub threshold: GapThreshold,
  entries: Vec<GapEntry>,
}

impl GapScan {
  #[inline]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[inline]
  pub fn entries(&self) -> &[GapEntry] {
    &self.entries
  }

  pub fn entry(&self, index: usize) -> Option<&GapEntry> {
    self.entries.get(index)
  }

  pub fn gap(&self, index: usize) -> Option<f64> {
    self.entries.get(index).and_then(|e| e.gap)
  }

  pub fn qualifies(&self, index: usize) -> bool {
    self.entries.get(index).is_some_and(|e| e.qualifies)
  }

  /// Low of the bar two periods earlier (bearish scans only)
  pub fn candle1_low(&self, index: usize) -> Option<f64> {
    match self.kind {
      GapKind::Bearish => self.entries.get(index).and_then(|e| e.candle1),
      GapKind::Bullish => None,
    }
  }

  /// Number of qualifying bars
  pub fn count(&self) -> usize {
    self.entries.iter().filter(|e| e.qualifies).count()
  }

  /// Qualifying gaps in bar order
  pub fn events(&self, bars: &[Bar]) -> Vec<GapEvent> {
    let detector = FairValueGapDetector::new(self.kind, self.threshold);
    self
      .entries
      .iter()
      .enumerate()
      .filter(|(_, e)| e.qualifies)
      .filter_map(|(i, _)| detector.detect(bars, i))
      .collect()
  }
}

/// Bullish scan: `gap[i] = low[i] - high[i - 2]`
pub fn scan_bullish(bars: &[Bar], threshold: GapThreshold) -> GapScan {
  FairValueGapDetector::bullish(threshold).scan(bars)
}

/// Bearish scan: `gap[i] = low[i - 2] - high[i]`
pub fn scan_bearish(bars: &[Bar], threshold: GapThreshold) -> GapScan {
  FairValueGapDetector::bearish(threshold).scan(bars)
}

pub fn scan_bullish_par(bars: &[Bar], threshold: GapThreshold) -> GapScan {
  FairValueGapDetector::bullish(threshold).scan_par(bars)
}

pub fn scan_bearish_par(bars: &[Bar], threshold: GapThreshold) -> GapScan {
  FairValueGapDetector::bearish(threshold).scan_par(bars)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  fn bar(i: u32, high: f64, low: f64) -> Bar {
    let mid = (high + low) / 2.0;
    Bar {
      date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(i)),
      open: mid,
      high,
      low,
      close: mid,
      log_return: 0.0,
      buy_hold: 1.0,
    }
  }

  fn threshold(v: f64) -> GapThreshold {
    GapThreshold::new(v).unwrap()
  }

  #[test]
  fn test_first_two_bars_never_qualify() {
    let bars = vec![bar(0, 100.0, 90.0), bar(1, 200.0, 150.0), bar(2, 300.0, 250.0)];
    let scan = scan_bullish(&bars, threshold(1.0));

    assert!(!scan.qualifies(0));
    assert!(!scan.qualifies(1));
    assert_eq!(scan.gap(0), None);
    assert_eq!(scan.gap(1), None);
    assert!(scan.qualifies(2));
  }

  #[test]
  fn test_bullish_gap_value() {
    let bars = vec![bar(0, 100.0, 95.0), bar(1, 108.0, 99.0), bar(2, 115.0, 112.0)];
    let scan = scan_bullish(&bars, threshold(10.0));

    assert_eq!(scan.gap(2), Some(12.0));
    assert!(scan.qualifies(2));
    assert_eq!(scan.count(), 1);
  }

  #[test]
  fn test_equality_qualifies() {
    let bars = vec![bar(0, 100.0, 95.0), bar(1, 108.0, 99.0), bar(2, 115.0, 110.0)];
    assert!(scan_bullish(&bars, threshold(10.0)).qualifies(2));
    assert!(!scan_bullish(&bars, threshold(10.000001)).qualifies(2));
  }

  #[test]
  fn test_bearish_gap_and_candle1_low() {
    let bars = vec![bar(0, 120.0, 115.0), bar(1, 114.0, 104.0), bar(2, 103.0, 98.0)];
    let scan = scan_bearish(&bars, threshold(10.0));

    assert_eq!(scan.gap(2), Some(12.0));
    assert!(scan.qualifies(2));
    assert_eq!(scan.candle1_low(2), Some(115.0));
    assert_eq!(scan.candle1_low(1), None);
  }

  #[test]
  fn test_bullish_scan_has_no_candle1_low() {
    let bars = vec![bar(0, 120.0, 115.0), bar(1, 114.0, 104.0), bar(2, 103.0, 98.0)];
    let scan = scan_bullish(&bars, threshold(10.0));
    assert_eq!(scan.candle1_low(2), None);
    assert!(!scan.qualifies(2));
  }

  #[test]
  fn test_events_carry_bounds() {
    let bars = vec![bar(0, 120.0, 115.0), bar(1, 114.0, 104.0), bar(2, 103.0, 98.0)];
    let scan = scan_bearish(&bars, threshold(10.0));
    let events = scan.events(&bars);

    assert_eq!(events.len(), 1);
    let e = events[0];
    assert_eq!(e.kind, GapKind::Bearish);
    assert_eq!(e.bar_index, 2);
    assert_eq!(e.date, bars[2].date);
    assert_eq!(e.lower_bound, 103.0);
    assert_eq!(e.upper_bound, 115.0);
  }

  #[test]
  fn test_parallel_scan_matches_sequential() {
    let bars: Vec<Bar> = (0..200)
      .map(|i| {
        let base = 100.0 + ((i * 37) % 50) as f64;
        bar(i, base + 3.0, base - 3.0)
      })
      .collect();

    let t = threshold(5.0);
    assert_eq!(scan_bullish(&bars, t), scan_bullish_par(&bars, t));
    assert_eq!(scan_bearish(&bars, t), scan_bearish_par(&bars, t));
  }

  #[test]
  fn test_count_matches_event_listing() {
    let bars: Vec<Bar> = (0..60)
      .map(|i| {
        let base = 100.0 + ((i * 37) % 50) as f64;
        bar(i, base + 3.0, base - 3.0)
      })
      .collect();
    let scan = scan_bearish(&bars, threshold(5.0));

    assert!(scan.count() > 0);
    assert_eq!(scan.count(), scan.events(&bars).len());
    assert_eq!(scan.entry(2).map(|e| e.qualifies), Some(scan.qualifies(2)));
    assert_eq!(scan.entry(bars.len()), None);
  }

  #[test]
  fn test_gap_kind_parse() {
    assert_eq!("Bullish".parse::<GapKind>().unwrap(), GapKind::Bullish);
    assert_eq!("short".parse::<GapKind>().unwrap(), GapKind::Bearish);
    assert!("sideways".parse::<GapKind>().is_err());
  }
}
