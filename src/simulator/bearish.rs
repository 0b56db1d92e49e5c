//! Bearish gap strategy
//!
//! A qualifying bearish gap is not shorted immediately. The simulator waits up to
//! `wait_days` bars for price to trade back up into the vacated range
//! `[high[i], low[i - 2]]`, shorts on the first bar whose high lands inside it, and
//! holds for `holding_days`. Gaps that never retrace expire without a trade.
//!
//! ```text
//!            qualifying gap              high in [lower, upper]
//!   Idle ---------------------> Waiting ------------------------> Holding
//!    ^                             |                                 |
//!    |      waiting_days >= wait   |     days_held >= holding_days   |
//!    +-----------------------------+---------------------------------+
//! ```
//!
//! Gaps that appear while Waiting or Holding are ignored.

use tracing::{debug, trace};

use super::{PositionSignal, PositionSimulator};
use crate::{
    detectors::{GapEntry, GapKind, GapScan},
    series::Bar,
    Period, Position,
};

/// Simulator state between bars
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BearishState {
    #[default]
    Idle,
    /// Gap seen, waiting for price to retrace into `[gap_lower, gap_upper]`
    Waiting {
        waiting_days: usize,
        gap_lower: f64,
        gap_upper: f64,
    },
    /// Short open; `days_held` counts from 1 on the entry bar
    Holding { days_held: usize },
}

/// Three-state short simulator
#[derive(Debug, Clone, Copy)]
pub struct BearishSimulator {
    pub holding_days: Period,
    pub wait_days: Period,
}

impl BearishSimulator {
    pub fn new(holding_days: Period, wait_days: Period) -> Self {
        Self {
            holding_days,
            wait_days,
        }
    }

    /// One transition for `bar` with its own-bar gap entry
    pub fn step(&self, state: BearishState, bar: &Bar, entry: &GapEntry) -> (Position, BearishState) {
        match state {
            BearishState::Holding { days_held } => self.on_holding(days_held),
            BearishState::Waiting {
                waiting_days,
                gap_lower,
                gap_upper,
            } => self.on_waiting(waiting_days, gap_lower, gap_upper, bar),
            BearishState::Idle => self.on_idle(bar, entry),
        }
    }

    fn on_holding(&self, days_held: usize) -> (Position, BearishState) {
        let held = days_held + 1;
        let next = if held >= self.holding_days.get() {
            BearishState::Idle
        } else {
            BearishState::Holding { days_held: held }
        };
        (Position::Short, next)
    }

    fn on_waiting(
        &self,
        waiting_days: usize,
        gap_lower: f64,
        gap_upper: f64,
        bar: &Bar,
    ) -> (Position, BearishState) {
        let waited = waiting_days + 1;

        if (gap_lower..=gap_upper).contains(&bar.high) {
            debug!(date = %bar.date, high = bar.high, gap_lower, gap_upper, "retracement, short entry");
            return (Position::Short, BearishState::Holding { days_held: 1 });
        }

        if waited >= self.wait_days.get() {
            trace!(date = %bar.date, waited, "gap expired without retracement");
            (Position::Flat, BearishState::Idle)
        } else {
            (
                Position::Flat,
                BearishState::Waiting {
                    waiting_days: waited,
                    gap_lower,
                    gap_upper,
                },
            )
        }
    }

    fn on_idle(&self, bar: &Bar, entry: &GapEntry) -> (Position, BearishState) {
        match (entry.qualifies, entry.candle1) {
            (true, Some(candle1_low)) => (
                Position::Flat,
                BearishState::Waiting {
                    waiting_days: 0,
                    gap_lower: bar.high,
                    gap_upper: candle1_low,
                },
            ),
            _ => (Position::Flat, BearishState::Idle),
        }
    }
}

impl PositionSimulator for BearishSimulator {
    fn kind(&self) -> GapKind {
        GapKind::Bearish
    }

    fn run(&self, bars: &[Bar], scan: &GapScan) -> PositionSignal {
        let mut state = BearishState::Idle;
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                let entry = scan.entry(i).copied().unwrap_or_default();
                let (position, next) = self.step(state, bar, &entry);
                state = next;
                position
            })
            .collect()
    }
}
