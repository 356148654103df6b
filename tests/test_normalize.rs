use session_forecast::normalize::{robust_z, OUTLIER_LIMIT};

/// Deterministic wavy series with genuine dispersion in every window
fn wavy_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (i as f64 * 0.7).sin() * 10.0 + i as f64 * 0.1)
        .collect()
}

fn same_value(a: f64, b: f64) -> bool {
    (a == b) || (a.is_nan() && b.is_nan())
}

#[test]
fn causality_future_values_never_change_past_z() {
    let series = wavy_series(80);
    let baseline = robust_z(&series, 20).unwrap();

    let mut mutated = series.clone();
    for v in mutated.iter_mut().skip(51) {
        *v = 9999.0;
    }
    let z = robust_z(&mutated, 20).unwrap();

    for t in 0..=50 {
        assert!(
            same_value(baseline[t], z[t]),
            "z[{}] changed after mutating the future: {} vs {}",
            t,
            baseline[t],
            z[t]
        );
    }
}

#[test]
fn determinism_identical_inputs_identical_outputs() {
    let mut series = wavy_series(60);
    series[13] = f64::NAN;
    series[14] = f64::INFINITY;

    let a = robust_z(&series, 15).unwrap();
    let b = robust_z(&series, 15).unwrap();

    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!(same_value(*x, *y));
    }
}

#[test]
fn output_is_winsorized() {
    let mut series = wavy_series(60);
    // An absurd spike must clamp, not explode.
    series[59] = 1e9;

    let z = robust_z(&series, 20).unwrap();
    assert_eq!(z[59], OUTLIER_LIMIT);
    for v in z.iter().filter(|v| v.is_finite()) {
        assert!(v.abs() <= OUTLIER_LIMIT);
    }
}

#[test]
fn warm_up_indices_are_undefined() {
    let z = robust_z(&wavy_series(30), 10).unwrap();
    // Index 0 has an empty window and index 1 a single-point window.
    assert!(z[0].is_nan());
    assert!(z[1].is_nan());
    assert!(z[5].is_finite());
}

#[test]
fn non_finite_inputs_stay_undefined_without_poisoning_neighbors() {
    let mut series = wavy_series(40);
    series[20] = f64::NAN;

    let z = robust_z(&series, 10).unwrap();
    assert!(z[20].is_nan());
    assert!(z[21].is_finite());
    assert!(z[25].is_finite());
}

#[test]
fn degenerate_dispersion_yields_nan_not_error() {
    // Constant history, then a jump: the window's MAD is zero.
    let mut series = vec![3.0; 25];
    series[24] = 100.0;

    let z = robust_z(&series, 10).unwrap();
    assert!(z[24].is_nan());
}
