//! Position simulators
//!
//! Convert a [`GapScan`] into one [`Position`] per bar. Both simulators walk the series
//! in chronological order and carry state from one bar to the next.

pub mod bearish;
pub mod bullish;

pub use bearish::{BearishSimulator, BearishState};
pub use bullish::BullishSimulator;

use crate::{detectors::GapKind, detectors::GapScan, series::Bar, FvgError, Position, Result};

/// Daily position decided at each bar's close
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PositionSignal {
    positions: Vec<Position>,
}

impl PositionSignal {
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions.iter().copied()
    }

    /// Signed exposure per bar (+1, -1, 0)
    pub fn values(&self) -> Vec<i8> {
        self.iter().map(Position::value).collect()
    }

    pub fn long_days(&self) -> usize {
        self.iter().filter(|p| *p == Position::Long).count()
    }

    pub fn short_days(&self) -> usize {
        self.iter().filter(|p| *p == Position::Short).count()
    }
}

impl FromIterator<Position> for PositionSignal {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Turns gap detections into a position signal
pub trait PositionSimulator: Send + Sync {
    /// Gap kind this simulator trades
    fn kind(&self) -> GapKind;

    /// Emit exactly one position per bar, in bar order
    fn run(&self, bars: &[Bar], scan: &GapScan) -> PositionSignal;

    /// [`run`](Self::run) after checking the scan matches the series
    fn simulate(&self, bars: &[Bar], scan: &GapScan) -> Result<PositionSignal> {
        if scan.kind != self.kind() {
            return Err(FvgError::InvalidConfig(format!(
                "{} simulator given a {} gap scan",
                self.kind(),
                scan.kind
            )));
        }
        if scan.len() != bars.len() {
            return Err(FvgError::LengthMismatch {
                what: "gap scan",
                expected: bars.len(),
                got: scan.len(),
            });
        }
        Ok(self.run(bars, scan))
    }
}
