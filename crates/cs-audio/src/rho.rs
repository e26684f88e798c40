use std::collections::BTreeMap;

use crate::track::Track;

/// Variance product below which a correlation window is degenerate.
const DEGENERATE_EPS: f64 = 1e-9;

/// Windowed Pearson correlation (ρ) between track frequency and block time.
///
/// For every track matched in the current block whose history spans the
/// configured window, ρ is the correlation between the last `window`
/// frequency samples and their indices — a proxy for monotonic frequency
/// drift. Block aggregates are accumulated toward a per-trial summary:
/// the mean of their absolute values.
///
/// # Example
/// ```
/// use cs_audio::rho::CorrelationScorer;
/// let scorer = CorrelationScorer::new(25);
/// assert_eq!(scorer.trial_summary(), 0.0);
/// ```
pub struct CorrelationScorer {
    window: usize,
    /// One aggregate per block that produced any ρ value.
    block_aggregates: Vec<f64>,
}

impl CorrelationScorer {
    /// Create a scorer with the given minimum window length.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            block_aggregates: Vec::new(),
        }
    }

    /// Forget all accumulated aggregates. Called once per trial.
    pub fn reset(&mut self) {
        self.block_aggregates.clear();
    }

    /// Score one block given the full track set after association.
    ///
    /// Only tracks with `seen` set and enough history contribute; windows
    /// with near-zero variance are skipped. Returns the block aggregate
    /// (mean ρ across qualifying tracks), if any track qualified.
    pub fn score_block(&mut self, tracks: &BTreeMap<u64, Track>) -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for track in tracks.values() {
            if !track.seen || track.history.len() < self.window {
                continue;
            }
            if let Some(r) = pearson_vs_index(&track.history.last_n(self.window)) {
                sum += r;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        let aggregate = sum / count as f64;
        self.block_aggregates.push(aggregate);
        Some(aggregate)
    }

    /// Number of blocks that have produced an aggregate so far. A zero
    /// summary with a zero count means "no correlation computed", not
    /// "correlation near zero".
    #[must_use]
    pub fn aggregate_count(&self) -> usize {
        self.block_aggregates.len()
    }

    /// Trial-level summary: mean of |block aggregate| over the whole file,
    /// or 0.0 if no block ever produced an aggregate.
    #[must_use]
    pub fn trial_summary(&self) -> f64 {
        if self.block_aggregates.is_empty() {
            return 0.0;
        }
        self.block_aggregates.iter().map(|r| r.abs()).sum::<f64>()
            / self.block_aggregates.len() as f64
    }
}

/// Pearson correlation between `values` and their indices `0..n`.
/// `None` when either variance is degenerate.
fn pearson_vs_index(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let x_mean = values.iter().sum::<f64>() / n;
    let t_mean = (n - 1.0) / 2.0;

    let mut sxx = 0.0;
    let mut stt = 0.0;
    let mut sxt = 0.0;
    for (i, &x) in values.iter().enumerate() {
        let dx = x - x_mean;
        let dt = i as f64 - t_mean;
        sxx += dx * dx;
        stt += dt * dt;
        sxt += dx * dt;
    }

    let denom = (sxx * stt).sqrt();
    if denom > DEGENERATE_EPS {
        Some(sxt / denom)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_history(values: &[f64], seen: bool) -> Track {
        let mut t = Track::new(values[0], 50);
        for &v in &values[1..] {
            t.history.push(v);
            t.f0 = v;
        }
        t.seen = seen;
        t
    }

    #[test]
    fn ascending_ramp_is_plus_one() {
        let values: Vec<f64> = (0..25).map(|i| 1000.0 + 20.0 * f64::from(i)).collect();
        let r = pearson_vs_index(&values);
        assert!(r.is_some_and(|r| (r - 1.0).abs() < 1e-12));
    }

    #[test]
    fn descending_ramp_is_minus_one() {
        let values: Vec<f64> = (0..25).map(|i| 9000.0 - 35.0 * f64::from(i)).collect();
        let r = pearson_vs_index(&values);
        assert!(r.is_some_and(|r| (r + 1.0).abs() < 1e-12));
    }

    #[test]
    fn constant_window_is_degenerate() {
        assert!(pearson_vs_index(&[440.0; 25]).is_none());
    }

    #[test]
    fn rho_stays_in_unit_interval() {
        // Non-monotonic zig-zag still yields a valid correlation.
        let values: Vec<f64> = (0..25)
            .map(|i| 5000.0 + if i % 2 == 0 { 17.0 } else { -13.0 } * f64::from(i))
            .collect();
        let r = pearson_vs_index(&values);
        assert!(r.is_some_and(|r| (-1.0..=1.0).contains(&r)));
    }

    #[test]
    fn unseen_or_short_tracks_do_not_contribute() {
        let mut scorer = CorrelationScorer::new(10);
        let ramp: Vec<f64> = (0..12).map(|i| 1000.0 + 5.0 * f64::from(i)).collect();

        let mut tracks = BTreeMap::new();
        tracks.insert(1, track_with_history(&ramp, false)); // long but unseen
        tracks.insert(2, track_with_history(&ramp[..4], true)); // seen but short
        assert!(scorer.score_block(&tracks).is_none());
        assert_eq!(scorer.trial_summary(), 0.0);
    }

    #[test]
    fn block_aggregate_is_mean_over_tracks() {
        let mut scorer = CorrelationScorer::new(10);
        let up: Vec<f64> = (0..10).map(|i| 1000.0 + 10.0 * f64::from(i)).collect();
        let down: Vec<f64> = (0..10).map(|i| 8000.0 - 10.0 * f64::from(i)).collect();

        let mut tracks = BTreeMap::new();
        tracks.insert(1, track_with_history(&up, true));
        tracks.insert(2, track_with_history(&down, true));

        let aggregate = scorer.score_block(&tracks);
        assert!(aggregate.is_some_and(|a| a.abs() < 1e-12), "ρ = {aggregate:?}");
    }

    #[test]
    fn summary_averages_absolute_aggregates() {
        let mut scorer = CorrelationScorer::new(10);
        let up: Vec<f64> = (0..10).map(|i| 1000.0 + 10.0 * f64::from(i)).collect();
        let down: Vec<f64> = (0..10).map(|i| 8000.0 - 10.0 * f64::from(i)).collect();

        let mut tracks = BTreeMap::new();
        tracks.insert(1, track_with_history(&up, true));
        scorer.score_block(&tracks); // +1

        tracks.insert(1, track_with_history(&down, true));
        scorer.score_block(&tracks); // -1

        assert_eq!(scorer.aggregate_count(), 2);
        assert!((scorer.trial_summary() - 1.0).abs() < 1e-12);

        scorer.reset();
        assert_eq!(scorer.aggregate_count(), 0);
        assert_eq!(scorer.trial_summary(), 0.0);
    }
}
