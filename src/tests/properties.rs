//! Cross-module invariants exercised on randomly generated series.

use crate::aggregation::{DistributionOptions, Window};
use crate::common::Value;
use crate::merge::{iter_merge, iter_merge_heap, MergeRow};
use crate::series::{ignorant, sum_values, TimeSeries};
use crate::tests::generators::{random_int_series, random_mask, random_series, GeneratorOptions};

fn options(seed: u64) -> GeneratorOptions {
    GeneratorOptions {
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_merge_strategies_agree_on_random_series() {
    for seed in 0..25 {
        let list: Vec<TimeSeries<i64, Value>> = (0..4)
            .map(|i| random_series(&options(seed * 31 + i)))
            .collect();
        let refs: Vec<&TimeSeries<i64, Value>> = list.iter().collect();
        let flat: Vec<MergeRow<i64, Value>> = iter_merge(&refs).collect();
        let heap: Vec<MergeRow<i64, Value>> = iter_merge_heap(&refs).collect();
        assert_eq!(flat, heap, "strategies diverged for seed {seed}");
    }
}

#[test]
fn test_merge_emits_strictly_increasing_distinct_times() {
    let list: Vec<TimeSeries<i64, Value>> =
        (0..3).map(|i| random_int_series(&options(7 + i))).collect();
    let refs: Vec<&TimeSeries<i64, Value>> = list.iter().collect();
    let times: Vec<i64> = iter_merge(&refs).map(|row| row.time).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_merge_then_apply_equals_sum() -> anyhow::Result<()> {
    for seed in 0..10 {
        let list: Vec<TimeSeries<i64, Value>> = (0..3)
            .map(|i| random_int_series(&options(seed * 17 + i)))
            .collect();
        let refs: Vec<&TimeSeries<i64, Value>> = list.iter().collect();

        let summed = TimeSeries::sum_many(&refs)?;
        let mut reducer = ignorant(sum_values);
        for row in iter_merge(&refs) {
            assert_eq!(summed.get(row.time), &reducer(&row.state)?);
        }
    }
    Ok(())
}

#[test]
fn test_compact_is_idempotent_on_random_series() {
    for seed in 0..20 {
        let mut series = random_int_series(&options(seed));
        series.compact();
        let once: Vec<(i64, Value)> = series.items().map(|(t, v)| (*t, v.clone())).collect();
        series.compact();
        let twice: Vec<(i64, Value)> = series.items().map(|(t, v)| (*t, v.clone())).collect();
        assert_eq!(once, twice);
        // no two adjacent values equal
        assert!(once.windows(2).all(|w| w[0].1 != w[1].1));
    }
}

#[test]
fn test_periods_tile_random_windows() {
    let series = random_int_series(&options(99));
    for (start, end) in [(-50i64, 1100i64), (10, 990), (250, 251)] {
        let periods: Vec<(i64, i64)> = series
            .iter_periods(Some(start), Some(end))
            .unwrap()
            .map(|(t0, t1, _)| (t0, t1))
            .collect();
        assert_eq!(periods.first().unwrap().0, start);
        assert_eq!(periods.last().unwrap().1, end);
        assert!(periods.iter().all(|(t0, t1)| t0 < t1));
        assert!(periods.windows(2).all(|w| w[0].1 == w[1].0));
    }
}

#[test]
fn test_distribution_weight_accounts_for_the_window() -> anyhow::Result<()> {
    let series = random_int_series(&options(5));
    let histogram = series.distribution(
        &Window::between(0, 1000),
        &DistributionOptions {
            normalized: false,
            ..Default::default()
        },
    )?;
    assert!((histogram.total() - 1000.0).abs() < 1e-9);

    let normalized = series.distribution(&Window::between(0, 1000), &Default::default())?;
    assert!((normalized.total() - 1.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_masked_distribution_weight_equals_mask_coverage() -> anyhow::Result<()> {
    let series = random_int_series(&options(11));
    let mask = random_mask(&options(13));
    let histogram = series.distribution(
        &Window::between(0, 1000).with_mask(&mask),
        &DistributionOptions {
            normalized: false,
            ..Default::default()
        },
    )?;
    let covered: i64 = mask
        .iter_periods_filtered(
            Some(0),
            Some(1000),
            crate::series::PeriodFilter::Value(true),
        )?
        .map(|(t0, t1, _)| t1 - t0)
        .sum();
    assert!((histogram.total() - covered as f64).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_series_round_trips_through_json() -> anyhow::Result<()> {
    let series = random_int_series(&options(21));
    let encoded = serde_json::to_string(&series)?;
    let decoded: TimeSeries<i64, Value> = serde_json::from_str(&encoded)?;
    assert_eq!(series, decoded);

    let wall_clock: TimeSeries<chrono::DateTime<chrono::Utc>, Value> = TimeSeries::from_pairs(
        [(chrono::Utc::now(), Value::from(1))],
        Value::Null,
    );
    let encoded = serde_json::to_string(&wall_clock)?;
    let decoded: TimeSeries<chrono::DateTime<chrono::Utc>, Value> =
        serde_json::from_str(&encoded)?;
    assert_eq!(wall_clock, decoded);
    Ok(())
}
