//! Utility functions for the session_forecast crate

use crate::data::DailyBar;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Return the value if finite, otherwise 0.0
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Mean of the finite values in a slice, or NaN when none are finite
pub fn mean_finite(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for &v in values {
        if v.is_finite() {
            sum += v;
            count += 1;
        }
    }

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Trailing average over the prior `window` values, current index excluded
///
/// `avg[t]` is the mean of the finite values in `series[max(0, t-window)..t)`.
/// Index 0 has no history and is NaN, as is any index whose window holds no
/// finite values. Partial windows are averaged over whatever history exists.
pub fn trailing_average(series: &[f64], window: usize) -> Vec<f64> {
    let mut averages = vec![f64::NAN; series.len()];
    if window == 0 {
        return averages;
    }

    for t in 1..series.len() {
        let start = t.saturating_sub(window);
        averages[t] = mean_finite(&series[start..t]);
    }

    averages
}

/// Generate synthetic daily bars for tests and examples
///
/// Produces `count` bars starting at `start_date` with a deterministic seeded
/// random walk: each close drifts by `drift_pct` percent plus normal noise of
/// `noise_pct` percent. Volume oscillates around 1,000,000.
pub fn generate_test_bars(
    count: usize,
    start_price: f64,
    drift_pct: f64,
    noise_pct: f64,
    seed: u64,
) -> Vec<DailyBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, noise_pct.max(1e-9)).unwrap();
    let start_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    let mut bars = Vec::with_capacity(count);
    let mut close = start_price;

    for i in 0..count {
        let change = (drift_pct + noise.sample(&mut rng)) / 100.0;
        let open = close;
        close *= 1.0 + change;
        let high = open.max(close) * 1.004;
        let low = open.min(close) * 0.996;
        let volume = 1_000_000.0 * (1.0 + 0.2 * ((i % 7) as f64 - 3.0) / 3.0);

        bars.push(DailyBar {
            date: start_date + chrono::Duration::days(i as i64 + (i / 5) as i64 * 2),
            open,
            high,
            low,
            close,
            volume,
        });
    }

    bars
}
