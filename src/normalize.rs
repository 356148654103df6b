//! Rolling robust normalization
//!
//! Converts any raw numeric series into a leakage-free, outlier-resistant
//! z-score series. Every window ends strictly before the index it normalizes,
//! so `z[t]` can never change when later values change.

use crate::error::{Result, SignalError};
use statrs::statistics::{Data, OrderStatistics};

/// Dispersion below this is treated as degenerate and yields an undefined z
pub const DISPERSION_EPSILON: f64 = 1e-12;

/// Scale factor making the MAD consistent with the standard deviation
/// under normality
pub const MAD_NORMAL_SCALE: f64 = 1.4826;

/// Members (and final z values) beyond this many robust deviations are
/// trimmed (respectively clamped)
pub const OUTLIER_LIMIT: f64 = 3.5;

fn median_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    Data::new(values.to_vec()).median()
}

/// Median absolute deviation around `center`, scaled by [`MAD_NORMAL_SCALE`]
fn scaled_mad(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median_of(&deviations) * MAD_NORMAL_SCALE
}

/// Clamp every finite value of a series into `[-limit, limit]`
pub fn winsorize(series: &mut [f64], limit: f64) {
    for v in series.iter_mut() {
        if v.is_finite() {
            *v = v.clamp(-limit, limit);
        }
    }
}

/// Rolling robust z-score of a raw series
///
/// For each index `t` the window is `series[max(0, t-lookback)..t)` - the
/// current value is excluded. The window's finite members are summarized by
/// median and scaled MAD, gross outliers beyond [`OUTLIER_LIMIT`] robust
/// deviations are dropped, the statistics are refit on the survivors, and
/// `z[t] = (series[t] - median) / mad` from the refit statistics. The z value
/// is NaN whenever the window keeps one or fewer usable points or the refit
/// MAD falls below [`DISPERSION_EPSILON`]. The output is winsorized to
/// ±[`OUTLIER_LIMIT`].
pub fn robust_z(series: &[f64], lookback: usize) -> Result<Vec<f64>> {
    if lookback == 0 {
        return Err(SignalError::InvalidParameter(
            "Lookback must be greater than zero".to_string(),
        ));
    }

    let mut z = vec![f64::NAN; series.len()];

    for t in 0..series.len() {
        if !series[t].is_finite() {
            continue;
        }

        let window: Vec<f64> = series[t.saturating_sub(lookback)..t]
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();

        if window.len() <= 1 {
            continue;
        }

        let median1 = median_of(&window);
        let mad1 = scaled_mad(&window, median1);
        if mad1 <= DISPERSION_EPSILON {
            continue;
        }

        let trimmed: Vec<f64> = window
            .iter()
            .copied()
            .filter(|v| ((v - median1) / mad1).abs() <= OUTLIER_LIMIT)
            .collect();

        if trimmed.len() <= 1 {
            continue;
        }

        let median2 = median_of(&trimmed);
        let mad2 = scaled_mad(&trimmed, median2);
        if mad2 <= DISPERSION_EPSILON {
            continue;
        }

        z[t] = (series[t] - median2) / mad2;
    }

    winsorize(&mut z, OUTLIER_LIMIT);

    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_window_yields_undefined_z() {
        let series = vec![5.0; 30];
        let z = robust_z(&series, 10).unwrap();
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn zero_lookback_is_rejected() {
        assert!(robust_z(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn winsorize_clamps_only_finite_values() {
        let mut series = vec![10.0, -10.0, 1.0, f64::NAN];
        winsorize(&mut series, 3.5);
        assert_eq!(series[0], 3.5);
        assert_eq!(series[1], -3.5);
        assert_eq!(series[2], 1.0);
        assert!(series[3].is_nan());
    }
}
