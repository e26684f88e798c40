use crate::track::FreqHistory;

/// Number of trailing history samples used for the velocity fit.
///
/// Fixed at 5 regardless of the configured smoothing or ρ windows.
pub const FIT_SAMPLES: usize = 5;

/// Least-squares frequency velocity (Hz/s) of a track's recent trajectory.
///
/// Fits a line to the last [`FIT_SAMPLES`] history samples against elapsed
/// time (`index * hop_secs`) and returns the slope. Histories shorter than
/// [`FIT_SAMPLES`] yield 0.0, as does a numerically singular fit.
///
/// # Example
/// ```
/// use cs_audio::track::FreqHistory;
/// use cs_audio::velocity::estimate;
/// let mut h = FreqHistory::new(16);
/// for i in 0..6 {
///     h.push(1000.0 + 10.0 * f64::from(i)); // +10 Hz per hop
/// }
/// let v = estimate(&h, 0.1); // hop = 100 ms -> 100 Hz/s
/// assert!((v - 100.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn estimate(history: &FreqHistory, hop_secs: f64) -> f64 {
    if history.len() < FIT_SAMPLES {
        return 0.0;
    }
    let y = history.last_n(FIT_SAMPLES);

    let n = y.len() as f64;
    let x_mean = hop_secs * (n - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let dx = i as f64 * hop_secs - x_mean;
        sxy += dx * (yi - y_mean);
        sxx += dx * dx;
    }

    // Degenerate abscissa (hop ~ 0): recover with zero velocity.
    if sxx.abs() < 1e-18 {
        return 0.0;
    }
    sxy / sxx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(values: &[f64]) -> FreqHistory {
        let mut h = FreqHistory::new(50);
        for &v in values {
            h.push(v);
        }
        h
    }

    #[test]
    fn short_history_has_zero_velocity() {
        let h = history_of(&[100.0, 110.0, 120.0, 130.0]);
        assert_eq!(estimate(&h, 0.042), 0.0);
    }

    #[test]
    fn linear_ramp_recovers_slope() {
        let hop = 2048.0 / 48_000.0;
        let rate = 500.0; // Hz/s
        let values: Vec<f64> = (0..10).map(|i| 2000.0 + rate * i as f64 * hop).collect();
        let v = estimate(&history_of(&values), hop);
        assert!((v - rate).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn fit_uses_only_last_five_samples() {
        // Early garbage must not influence the fit.
        let hop = 0.05;
        let mut values = vec![9000.0, 100.0, 7777.0];
        values.extend((0..FIT_SAMPLES).map(|i| 1000.0 + 20.0 * i as f64));
        let v = estimate(&history_of(&values), hop);
        assert!((v - 20.0 / hop).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn constant_history_has_zero_slope() {
        let h = history_of(&[500.0; 8]);
        let v = estimate(&h, 0.042);
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn zero_hop_is_recovered_as_zero() {
        let h = history_of(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(estimate(&h, 0.0), 0.0);
    }
}
