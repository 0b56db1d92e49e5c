//! Bullish gap strategy: go long on the bar a gap qualifies and hold for a fixed count.

use tracing::trace;

use super::{PositionSignal, PositionSimulator};
use crate::{detectors::GapKind, detectors::GapScan, series::Bar, Period, Position};

/// Long-only cooldown simulator
#[derive(Debug, Clone, Copy)]
pub struct BullishSimulator {
    pub holding_days: Period,
}

impl BullishSimulator {
    pub fn new(holding_days: Period) -> Self {
        Self { holding_days }
    }

    /// One transition. `days_held == 0` means no open position.
    ///
    /// While held the counter increments each bar and resets once it reaches
    /// `holding_days`; the bar that resets still counts as long.
    #[inline]
    pub fn step(&self, days_held: usize, qualifies: bool) -> (Position, usize) {
        if days_held > 0 {
            let held = days_held + 1;
            let next = if held >= self.holding_days.get() { 0 } else { held };
            (Position::Long, next)
        } else if qualifies {
            (Position::Long, 1)
        } else {
            (Position::Flat, 0)
        }
    }
}

impl PositionSimulator for BullishSimulator {
    fn kind(&self) -> GapKind {
        GapKind::Bullish
    }

    fn run(&self, bars: &[Bar], scan: &GapScan) -> PositionSignal {
        let mut days_held = 0;
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let (position, next) = self.step(days_held, scan.qualifies(i));
                if days_held == 0 && next == 1 {
                    trace!(date = %bar.date, "bullish entry");
                }
                days_held = next;
                position
            })
            .collect()
    }
}
