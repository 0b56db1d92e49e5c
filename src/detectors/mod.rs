//! Fair value gap detectors
//!
//! A fair value gap is a three-bar imbalance: the range between bar `i`'s extreme and
//! bar `i - 2`'s opposite extreme that bar `i - 1` never traded through.
//!
//! # Gap Kinds
//!
//! - **Bullish**: `gap[i] = low[i] - high[i - 2]`
//! - **Bearish**: `gap[i] = low[i - 2] - high[i]`
//!
//! A gap qualifies when it is at least the configured [`GapThreshold`](crate::GapThreshold).

pub mod gap;

pub use gap::*;
