//! Benchmarks for gap scans and full backtest runs.

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fairgap::detectors::scan_bullish_par;
use fairgap::prelude::*;

/// Generate realistic random rows
fn generate_rows(n: usize) -> Vec<RawBar> {
  let start = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
  let mut rows = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 10.0 - 4.9; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64;

    let o = price;
    let c = (price + change).max(10.0);
    let h = o.max(c) + volatility * 0.5;
    let l = (o.min(c) - volatility * 0.5).max(1.0);

    rows.push(RawBar::new(start + Days::new(i as u64), o, h, l, c));
    price = c;
  }

  rows
}

fn bench_scans(c: &mut Criterion) {
  let series = PriceSeries::prepare(&generate_rows(5000)).unwrap();
  let threshold = GapThreshold::new(5.0).unwrap();

  c.bench_function("scan_bullish_5000_bars", |b| {
    b.iter(|| black_box(scan_bullish(black_box(series.bars()), threshold)))
  });

  c.bench_function("scan_bullish_par_5000_bars", |b| {
    b.iter(|| black_box(scan_bullish_par(black_box(series.bars()), threshold)))
  });
}

fn bench_backtest_sizes(c: &mut Criterion) {
  let mut group = c.benchmark_group("backtest_by_size");
  let params = StrategyParams::new(5.0, 5, 3).unwrap();

  for size in [250, 2500, 10000] {
    let series = PriceSeries::prepare(&generate_rows(size)).unwrap();
    let bt = Backtest::new("BENCH", series, params);

    group.bench_with_input(BenchmarkId::new("bullish", size), &bt, |b, bt| {
      b.iter(|| black_box(bt.run_bullish()))
    });
    group.bench_with_input(BenchmarkId::new("bearish", size), &bt, |b, bt| {
      b.iter(|| black_box(bt.run_bearish()))
    });
  }

  group.finish();
}

fn bench_sweep(c: &mut Criterion) {
  let series = PriceSeries::prepare(&generate_rows(2500)).unwrap();
  let grid = SweepGrid::new(vec![2.0, 5.0, 10.0], vec![1, 3, 5, 10], vec![2, 3]).unwrap().combinations();

  c.bench_function("sweep_bearish_24_combinations", |b| {
    b.iter(|| black_box(sweep("BENCH", &series, GapKind::Bearish, &grid)))
  });
}

criterion_group!(benches, bench_scans, bench_backtest_sizes, bench_sweep);
criterion_main!(benches);
